use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use domain::Order;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::{debug, info};

use crate::{decode, encode, CacheError, OrderCache};

/// Redis cache for order snapshots
pub struct RedisOrderCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisOrderCache {
    /// Connect to Redis; every later round-trip is bounded by `op_timeout`
    pub async fn new(redis_url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Redis order cache initialized with op timeout: {:?}", op_timeout);
        Ok(Self { conn, op_timeout })
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, RedisError>> + Send,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }

    /// Check if cache is available (health check)
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = self
            .bounded(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderCache for RedisOrderCache {
    async fn get(&self, key: &str) -> Result<Option<Order>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = self
            .bounded(async move { conn.get::<_, Option<String>>(key).await })
            .await?;

        match value {
            Some(payload) => {
                let order = decode(&payload)?;
                debug!("Cache {} for key: {}", if order.is_some() { "hit" } else { "empty" }, key);
                Ok(order)
            }
            None => {
                debug!("Cache miss for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, order: &Order, ttl: Duration) -> Result<(), CacheError> {
        let json = encode(order)?;
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);

        let mut conn = self.conn.clone();
        self.bounded(async move { conn.set_ex::<_, _, ()>(key, json, seconds).await })
            .await?;

        debug!("Cached value for key: {} with TTL: {}s", key, seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.del::<_, ()>(key).await })
            .await?;

        debug!("Deleted cache for key: {}", key);
        Ok(())
    }
}
