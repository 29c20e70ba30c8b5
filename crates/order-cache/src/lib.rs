pub mod memory;
pub mod redis_cache;

pub use memory::InMemoryOrderCache;
pub use redis_cache::RedisOrderCache;

use std::time::Duration;

use async_trait::async_trait;
use domain::Order;
use thiserror::Error;

/// Key-value cache of serialized order snapshots.
///
/// The cache is never the system of record: callers treat every error as a miss.
#[async_trait]
pub trait OrderCache: Send + Sync {
    /// Get a snapshot; `Ok(None)` on miss or expiry
    async fn get(&self, key: &str) -> Result<Option<Order>, CacheError>;

    /// Replace the snapshot stored under `key`
    async fn set(&self, key: &str, order: &Order, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Cache that stores nothing. Every lookup is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOrderCache;

#[async_trait]
impl OrderCache for NoopOrderCache {
    async fn get(&self, _key: &str) -> Result<Option<Order>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _order: &Order, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

pub(crate) fn encode(order: &Order) -> Result<String, CacheError> {
    Ok(serde_json::to_string(order)?)
}

/// An empty payload counts as absent.
pub(crate) fn decode(payload: &str) -> Result<Option<Order>, CacheError> {
    if payload.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(payload)?))
}
