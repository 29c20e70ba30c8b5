use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use domain::Order;

use crate::{decode, encode, CacheError, OrderCache};

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    /// `None` when the ttl is too large to represent; such entries never expire
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// In-process cache with per-entry expiry.
///
/// Snapshots are stored as JSON, the same bytes Redis would hold, so a
/// snapshot that would not survive Redis does not survive here either.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw payload, bypassing serialization
    pub fn insert_raw(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(
            key.to_string(),
            Entry {
                payload: payload.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .get(key)
                    .map_or(false, |entry| entry.is_live(Instant::now()))
            })
            .unwrap_or(false)
    }

    /// Number of stored entries, expired ones included until they are next read
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderCache for InMemoryOrderCache {
    async fn get(&self, key: &str) -> Result<Option<Order>, CacheError> {
        let payload = {
            let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
            match entries.get(key) {
                Some(entry) if entry.is_live(Instant::now()) => Some(entry.payload.clone()),
                Some(_) => None,
                None => return Ok(None),
            }
        };

        match payload {
            Some(payload) => decode(&payload),
            None => {
                // Expired: drop it so `len` stays honest.
                let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
                if entries
                    .get(key)
                    .map_or(false, |entry| !entry.is_live(Instant::now()))
                {
                    entries.remove(key);
                }
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, order: &Order, ttl: Duration) -> Result<(), CacheError> {
        let payload = encode(order)?;
        self.insert_raw(key, &payload, ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OrderItem;

    fn order(id: i64, total: i64) -> Order {
        let mut order = Order::new(1, vec![OrderItem::new("book", 1, total)]);
        order.id = id;
        order.total = total;
        order
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryOrderCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("order:1", &order(1, 500), ttl).await.unwrap();
        assert!(cache.contains("order:1"));
        assert_eq!(cache.get("order:1").await.unwrap(), Some(order(1, 500)));

        cache.delete("order:1").await.unwrap();
        assert!(cache.get("order:1").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_set_replaces_snapshot() {
        let cache = InMemoryOrderCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("order:1", &order(1, 500), ttl).await.unwrap();
        cache.set("order:1", &order(1, 700), ttl).await.unwrap();

        assert_eq!(cache.get("order:1").await.unwrap().unwrap().total, 700);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = InMemoryOrderCache::new();

        cache
            .set("order:2", &order(2, 100), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!cache.contains("order:2"));
        assert!(cache.get("order:2").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_unbounded_ttl_never_expires() {
        let cache = InMemoryOrderCache::new();

        cache
            .set("order:4", &order(4, 100), Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert!(cache.contains("order:4"));
        assert_eq!(cache.get("order:4").await.unwrap(), Some(order(4, 100)));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let cache = InMemoryOrderCache::new();
        tokio_test::assert_ok!(cache.delete("order:404").await);
    }

    #[tokio::test]
    async fn test_corrupted_payload_is_error() {
        let cache = InMemoryOrderCache::new();
        cache
            .insert_raw("order:3", "not-json", Duration::from_secs(60))
            .unwrap();

        tokio_test::assert_err!(cache.get("order:3").await);
    }
}
