use super::{DeletedOrder, OrderLookup, OrderStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Order, OrderItem};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    name: String,
    quantity: i32,
    price: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

/// PostgreSQL implementation of the order store
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the database pool (useful for testing)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Read-only transaction over a single snapshot. The header and its items
    /// must come from the same snapshot or a concurrent update can pair an old
    /// total with new items.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

fn ensure_items(order: &Order) -> Result<(), StoreError> {
    if order.items.is_empty() {
        return Err(StoreError::InvalidAggregate(
            "order must have at least one item".to_string(),
        ));
    }
    Ok(())
}

async fn insert_items(
    conn: &mut PgConnection,
    order_id: i64,
    items: &[OrderItem],
) -> Result<Vec<OrderItem>, StoreError> {
    let mut inserted = Vec::with_capacity(items.len());

    for item in items {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_items (order_id, name, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .fetch_one(&mut *conn)
        .await?;

        inserted.push(OrderItem {
            id,
            order_id,
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price,
        });
    }

    Ok(inserted)
}

async fn load_items(conn: &mut PgConnection, order_id: i64) -> Result<Vec<OrderItem>, StoreError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT id, order_id, name, quantity, price
        FROM order_items
        WHERE order_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order(&self, order: &Order) -> Result<Order, StoreError> {
        ensure_items(order)?;

        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (user_id, total, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, user_id, total, created_at, updated_at
            "#,
        )
        .bind(order.user_id)
        .bind(order.total)
        .fetch_one(&mut *tx)
        .await?;

        debug!("Inserted order header {} for user {}", header.id, header.user_id);

        // Dropping `tx` on an early return rolls the header back.
        let items = insert_items(&mut tx, header.id, &order.items).await?;

        tx.commit().await?;

        info!(
            order_id = header.id,
            user_id = header.user_id,
            items = items.len(),
            "Order created"
        );

        Ok(header.into_order(items))
    }

    async fn get_order_by_id(&self, id: i64) -> Result<Order, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let header = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(OrderLookup::Id(id)))?;

        let items = load_items(&mut tx, header.id).await?;
        tx.commit().await?;
        debug!("Loaded order {} with {} items", id, items.len());

        Ok(header.into_order(items))
    }

    async fn get_order_by_user_id(&self, user_id: i64) -> Result<Order, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let header = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(OrderLookup::User(user_id)))?;

        let items = load_items(&mut tx, header.id).await?;
        tx.commit().await?;
        debug!(
            "Loaded latest order {} of user {} with {} items",
            header.id,
            user_id,
            items.len()
        );

        Ok(header.into_order(items))
    }

    async fn update_order(&self, order: &Order) -> Result<Order, StoreError> {
        ensure_items(order)?;

        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET total = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, user_id, total, created_at, updated_at
            "#,
        )
        .bind(order.total)
        .bind(order.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(OrderLookup::Id(order.id)))?;

        // The new total is derived from these items, so they replace the stored
        // ones in the same transaction.
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(header.id)
            .execute(&mut *tx)
            .await?;
        let items = insert_items(&mut tx, header.id, &order.items).await?;

        tx.commit().await?;

        info!(order_id = header.id, total = header.total, "Order updated");

        Ok(header.into_order(items))
    }

    async fn delete_order_by_id(&self, id: i64) -> Result<DeletedOrder, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed_items = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let user_id: i64 = sqlx::query_scalar("DELETE FROM orders WHERE id = $1 RETURNING user_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(OrderLookup::Id(id)))?;

        tx.commit().await?;

        info!(
            order_id = id,
            user_id,
            items = removed_items,
            "Order deleted"
        );

        Ok(DeletedOrder { id, user_id })
    }
}
