//! In-memory cache - the page cache backend when Redis is not configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use yatube_core::ports::{Cache, CacheError};

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Process-local cache: a HashMap behind an async RwLock.
///
/// Expired entries are dropped on the first read after they expire, and all
/// of them on every write. Contents are lost on restart and not shared between server processes.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let store = self.store.read().await;
        store.values().filter(|e| !e.is_expired(now)).count()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            let entry = store.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        // Expired: re-check under the write lock, a writer may have refreshed it.
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|e| e.is_expired(now)) {
            store.remove(key);
            tracing::trace!(key = %key, "Evicted expired cache entry");
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        let purged = before - store.len();
        if purged > 0 {
            tracing::trace!(purged, "Purged expired cache entries");
        }

        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: ttl.map(|d| now + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.starts_with(prefix));
        let removed = before - store.len();
        tracing::debug!(prefix = %prefix, removed, "Cleared cache entries");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        cache.delete("key1").await.unwrap();
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = InMemoryCache::new();
        cache
            .set("page:/", "<feed>", Some(Duration::from_millis(30)))
            .await
            .unwrap();
        assert!(cache.exists("page:/").await);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("page:/").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_write_purges_expired_entries() {
        let cache = InMemoryCache::new();
        for page in 1..=5 {
            cache
                .set(&format!("page:/?page={page}"), "<feed>", Some(Duration::from_millis(30)))
                .await
                .unwrap();
        }
        cache.set("other", "kept", None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.set("page:/?page=1", "<fresh>", Some(Duration::from_secs(20))).await.unwrap();

        let store = cache.store.read().await;
        assert_eq!(store.len(), 2);
        assert!(store.contains_key("other"));
        assert_eq!(store["page:/?page=1"].value, "<fresh>");
    }

    #[tokio::test]
    async fn test_clear_prefix_keeps_other_keys() {
        let cache = InMemoryCache::new();
        cache.set("page:/", "a", None).await.unwrap();
        cache.set("page:/?page=2", "b", None).await.unwrap();
        cache.set("other", "c", None).await.unwrap();

        assert_eq!(cache.clear_prefix("page:").await.unwrap(), 2);
        assert_eq!(cache.get("page:/").await, None);
        assert_eq!(cache.get("other").await, Some("c".to_string()));
    }
}
