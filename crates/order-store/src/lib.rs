pub mod postgres_order_store;

pub use postgres_order_store::PostgresOrderStore;

use std::fmt;

use async_trait::async_trait;
use domain::Order;
use sqlx::migrate::Migrator;
use thiserror::Error;

/// Schema for the `orders` and `order_items` tables.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// How an order was looked up, carried by `NotFound` so callers can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLookup {
    Id(i64),
    User(i64),
}

impl fmt::Display for OrderLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderLookup::Id(id) => write!(f, "id {}", id),
            OrderLookup::User(user_id) => write!(f, "user {}", user_id),
        }
    }
}

/// Identity of an order removed by `delete_order_by_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedOrder {
    pub id: i64,
    pub user_id: i64,
}

/// Durable storage for order aggregates.
///
/// Every method that touches more than one row runs in a single transaction:
/// it either commits completely or leaves no trace.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the header and all items; returns the aggregate with store-assigned ids and timestamps
    async fn create_order(&self, order: &Order) -> Result<Order, StoreError>;

    /// Load an aggregate by primary key
    async fn get_order_by_id(&self, id: i64) -> Result<Order, StoreError>;

    /// Load the most recently created aggregate of a user
    async fn get_order_by_user_id(&self, user_id: i64) -> Result<Order, StoreError>;

    /// Persist a new total and item list; refreshes `updated_at`
    async fn update_order(&self, order: &Order) -> Result<Order, StoreError>;

    /// Remove the items and then the header
    async fn delete_order_by_id(&self, id: i64) -> Result<DeletedOrder, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(OrderLookup),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid aggregate: {0}")]
    InvalidAggregate(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::DatabaseError(err)
    }
}
