use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// Line item owned by exactly one order.
///
/// `id` and `order_id` are assigned by the store; clients only supply
/// `name`, `quantity` and `price`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,

    #[validate(length(min = 1, message = "Item name cannot be empty"))]
    pub name: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    /// Unit price in minor currency units.
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: i32, price: i64) -> Self {
        Self {
            id: 0,
            order_id: 0,
            name: name.into(),
            quantity,
            price,
        }
    }

    /// `price * quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

/// Order aggregate root: the header plus its line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    /// Always derived from `items`; anything a client sends here is overwritten.
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a client-side order that has not been persisted yet.
    pub fn new(user_id: i64, items: Vec<OrderItem>) -> Self {
        Self {
            user_id,
            items,
            ..Default::default()
        }
    }

    /// Check the invariants every persisted order must satisfy.
    pub fn validate_for_write(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::NoItems);
        }

        for (index, item) in self.items.iter().enumerate() {
            item.validate().map_err(|e| DomainError::InvalidItem {
                index,
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Validate and overwrite `total` with the sum of the line totals.
    pub fn recompute_total(&mut self) -> Result<i64, DomainError> {
        self.validate_for_write()?;
        self.total = compute_total(&self.items)?;
        Ok(self.total)
    }
}

/// Sum of `price * quantity` over all items, with overflow reported as an error.
pub fn compute_total(items: &[OrderItem]) -> Result<i64, DomainError> {
    items.iter().try_fold(0i64, |acc, item| {
        item.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or(DomainError::TotalOverflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<OrderItem> {
        vec![OrderItem::new("keyboard", 2, 100), OrderItem::new("mouse", 3, 50)]
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(&sample_items()).unwrap(), 350);
        assert_eq!(compute_total(&[]).unwrap(), 0);
    }

    #[test]
    fn test_recompute_total_overwrites_client_total() {
        let mut order = Order::new(7, sample_items());
        order.total = 1;

        let total = order.recompute_total().unwrap();
        assert_eq!(total, 350);
        assert_eq!(order.total, 350);
    }

    #[test]
    fn test_free_items_are_allowed() {
        let mut order = Order::new(1, vec![OrderItem::new("sticker", 5, 0)]);
        assert_eq!(order.recompute_total().unwrap(), 0);
    }

    #[test]
    fn test_no_items() {
        let mut order = Order::new(1, vec![]);
        assert_eq!(order.recompute_total(), Err(DomainError::NoItems));
    }

    #[test]
    fn test_invalid_quantity() {
        let order = Order::new(
            1,
            vec![OrderItem::new("ok", 1, 10), OrderItem::new("bad", 0, 10)],
        );

        match order.validate_for_write() {
            Err(DomainError::InvalidItem { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("Quantity must be at least 1"));
            }
            other => panic!("expected InvalidItem, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_price() {
        let order = Order::new(1, vec![OrderItem::new("refund", 1, -5)]);
        assert!(matches!(
            order.validate_for_write(),
            Err(DomainError::InvalidItem { index: 0, .. })
        ));
    }

    #[test]
    fn test_empty_name() {
        let order = Order::new(1, vec![OrderItem::new("", 1, 5)]);
        assert!(order.validate_for_write().is_err());
    }

    #[test]
    fn test_total_overflow() {
        let mut order = Order::new(1, vec![OrderItem::new("gold", i32::MAX, i64::MAX)]);
        assert_eq!(order.recompute_total(), Err(DomainError::TotalOverflow));

        let items = vec![
            OrderItem::new("a", 1, i64::MAX),
            OrderItem::new("b", 1, 1),
        ];
        assert_eq!(compute_total(&items), Err(DomainError::TotalOverflow));
    }

    #[test]
    fn test_order_serialization_keeps_nested_items() {
        let mut order = Order::new(42, sample_items());
        order.id = 9;
        order.items[0].id = 1;
        order.items[0].order_id = 9;
        order.recompute_total().unwrap();
        order.created_at = Utc::now();
        order.updated_at = order.created_at;

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(order, deserialized);
    }

    #[test]
    fn test_partial_client_payload() {
        let json = r#"{"user_id": 3, "items": [{"name": "pen", "quantity": 4, "price": 25}], "total": 999}"#;
        let mut order: Order = serde_json::from_str(json).unwrap();

        assert_eq!(order.id, 0);
        assert_eq!(order.items[0].id, 0);
        assert_eq!(order.recompute_total().unwrap(), 100);
    }
}
