use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::metrics::{self, CacheOutcome};
use domain::{DomainError, Order};
use order_cache::OrderCache;
use order_store::{OrderStore, StoreError};
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::keys::{order_key, user_order_key};

/// How long a cached snapshot may be served before it must be re-read.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Read/write API over order aggregates.
///
/// The store is the source of truth. The cache only saves store round-trips:
/// a cache miss, a cache error and a stale entry can change latency, never the
/// result. Every cache mutation happens after the store has committed, and no
/// cache call is made for a write the store rejected.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    cache_ttl: Duration,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self {
            store,
            cache,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Validate, price and persist a new order.
    ///
    /// Any client-supplied total is replaced by the computed one. The new
    /// aggregate is not cached; the first read populates it.
    pub async fn create_order(&self, mut order: Order) -> Result<Order, ServiceError> {
        order.recompute_total()?;

        let created = self
            .store_call("create_order", || self.store.create_order(&order))
            .await?;

        // The user's most recent order just changed.
        self.invalidate(&user_order_key(created.user_id)).await;

        info!(
            order_id = created.id,
            user_id = created.user_id,
            total = created.total,
            "Order created"
        );
        Ok(created)
    }

    pub async fn get_order_by_id(&self, id: i64) -> Result<Order, ServiceError> {
        self.read_through("order_by_id", order_key(id), || {
            self.store.get_order_by_id(id)
        })
        .await
    }

    /// Most recently created order of `user_id`.
    pub async fn get_order_by_user_id(&self, user_id: i64) -> Result<Order, ServiceError> {
        self.read_through("order_by_user", user_order_key(user_id), || {
            self.store.get_order_by_user_id(user_id)
        })
        .await
    }

    /// Re-price and persist an existing order, then write the new snapshot
    /// through to the cache.
    pub async fn update_order(&self, mut order: Order) -> Result<Order, ServiceError> {
        if order.id <= 0 {
            return Err(DomainError::ValidationError(format!(
                "order id must be positive, got {}",
                order.id
            ))
            .into());
        }
        order.recompute_total()?;

        let updated = self
            .store_call("update_order", || self.store.update_order(&order))
            .await?;

        self.refresh(&order_key(updated.id), &updated).await;
        self.invalidate(&user_order_key(updated.user_id)).await;

        info!(order_id = updated.id, total = updated.total, "Order updated");
        Ok(updated)
    }

    /// Delete from the store, then drop every cache entry that could still
    /// serve the order. A failed delete leaves the cache alone.
    pub async fn delete_order(&self, id: i64) -> Result<(), ServiceError> {
        let deleted = self
            .store_call("delete_order_by_id", || self.store.delete_order_by_id(id))
            .await?;

        self.invalidate(&order_key(deleted.id)).await;
        self.invalidate(&user_order_key(deleted.user_id)).await;

        info!(order_id = deleted.id, user_id = deleted.user_id, "Order deleted");
        Ok(())
    }

    async fn read_through<F, Fut>(
        &self,
        lookup: &'static str,
        key: String,
        fetch: F,
    ) -> Result<Order, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Order, StoreError>>,
    {
        if let Some(order) = self.cached(lookup, &key).await {
            return Ok(order);
        }

        let order = self.store_call(lookup, fetch).await?;
        self.refresh(&key, &order).await;

        Ok(order)
    }

    async fn store_call<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let started = Instant::now();
        let result = call().await;
        metrics::record_store_operation(
            operation,
            result.is_ok(),
            started.elapsed().as_secs_f64(),
        );
        result
    }

    async fn cached(&self, lookup: &'static str, key: &str) -> Option<Order> {
        match self.cache.get(key).await {
            Ok(Some(order)) => {
                debug!("Cache hit for key: {}", key);
                metrics::record_cache_request(lookup, CacheOutcome::Hit);
                Some(order)
            }
            Ok(None) => {
                debug!("Cache miss for key: {}, querying store", key);
                metrics::record_cache_request(lookup, CacheOutcome::Miss);
                None
            }
            Err(e) => {
                warn!("Cache read failed for key {}: {}; querying store", key, e);
                metrics::record_cache_request(lookup, CacheOutcome::Error);
                None
            }
        }
    }

    async fn refresh(&self, key: &str, order: &Order) {
        if let Err(e) = self.cache.set(key, order, self.cache_ttl).await {
            warn!("Failed to cache snapshot for key {}: {}", key, e);
            metrics::record_cache_write_failure("set");
        }
    }

    async fn invalidate(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!("Failed to invalidate cache key {}: {}", key, e);
            metrics::record_cache_write_failure("delete");
        }
    }
}
