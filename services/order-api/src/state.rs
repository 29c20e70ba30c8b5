use std::sync::Arc;

use anyhow::Result;
use common::{AppConfig, CacheConfig};
use order_cache::{CacheError, NoopOrderCache, OrderCache, RedisOrderCache};
use order_service::OrderService;
use order_store::{OrderStore, PostgresOrderStore, MIGRATOR};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;

/// Which cache sits in front of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    /// Redis was unreachable at startup; every read goes to Postgres
    Disabled,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub cache_backend: CacheBackend,
}

impl AppState {
    pub fn new(orders: OrderService, cache_backend: CacheBackend) -> Self {
        Self {
            orders,
            cache_backend,
        }
    }

    /// Connect to Postgres and Redis and wire them into the order service
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url())
            .await?;
        tracing::info!("Database connected");

        if config.server.run_migrations {
            tracing::info!("Running database migrations...");
            MIGRATOR.run(&pool).await?;
        }

        let store = Arc::new(PostgresOrderStore::new(pool)) as Arc<dyn OrderStore>;

        // Orders are still served from Postgres when Redis is down.
        tracing::info!("Connecting to Redis...");
        let (cache, cache_backend) = match connect_cache(&config.cache).await {
            Ok(cache) => {
                tracing::info!("Redis connected");
                (Arc::new(cache) as Arc<dyn OrderCache>, CacheBackend::Redis)
            }
            Err(e) => {
                tracing::warn!("Redis unavailable ({}), running without a cache", e);
                (Arc::new(NoopOrderCache) as Arc<dyn OrderCache>, CacheBackend::Disabled)
            }
        };

        let orders = OrderService::new(store, cache).with_cache_ttl(config.cache.ttl());

        Ok(Self::new(orders, cache_backend))
    }
}

async fn connect_cache(config: &CacheConfig) -> Result<RedisOrderCache, CacheError> {
    let cache = RedisOrderCache::new(&config.redis_url, config.op_timeout()).await?;
    cache.ping().await?;
    Ok(cache)
}
