//! Whole-page cache for rendered responses.
//!
//! Every viewer gets the same bytes while an entry is alive, including
//! content that has been deleted since it was rendered. `clear` is the only
//! way to drop entries early.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{Cache, CacheError};

const KEY_PREFIX: &str = "page:";

/// Default lifetime of a cached page.
pub const PAGE_CACHE_TTL: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct PageCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Cache key for a route: its path plus the resolved page number, so there
    /// is at most one entry per existing page.
    pub fn key(path: &str, page: u64) -> String {
        format!("{KEY_PREFIX}{path}?page={page}")
    }

    /// Return the cached page under `key`, or render, store and return it.
    pub async fn get_or_render<F, Fut, E>(&self, key: &str, render: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: From<CacheError>,
    {
        if let Some(page) = self.cache.get(key).await {
            return Ok(page);
        }

        let page = render().await?;
        self.cache.set(key, &page, Some(self.ttl)).await?;
        Ok(page)
    }

    /// Drop every cached page. Returns how many entries were removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        self.cache.clear_prefix(KEY_PREFIX).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Bare map, no expiry; enough to exercise the hit/miss logic.
    #[derive(Default)]
    struct MapCache(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl Cache for MapCache {
        async fn get(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }

        async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
            self.0.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }

        async fn exists(&self, key: &str) -> bool {
            self.0.lock().unwrap().contains_key(key)
        }

        async fn clear_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
            let mut map = self.0.lock().unwrap();
            let before = map.len();
            map.retain(|k, _| !k.starts_with(prefix));
            Ok(before - map.len())
        }
    }

    fn page_cache() -> PageCache {
        PageCache::new(Arc::new(MapCache::default()), PAGE_CACHE_TTL)
    }

    #[test]
    fn test_key_carries_page_number() {
        assert_eq!(PageCache::key("/", 1), "page:/?page=1");
        assert_eq!(PageCache::key("/", 2), "page:/?page=2");
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let cache = page_cache();
        let first: Result<String, CacheError> =
            cache.get_or_render("page:/", || async { Ok("v1".to_string()) }).await;
        let second: Result<String, CacheError> =
            cache.get_or_render("page:/", || async { Ok("v2".to_string()) }).await;

        assert_eq!(first.unwrap(), "v1");
        assert_eq!(second.unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_clear_forces_rerender() {
        let cache = page_cache();
        let _: Result<String, CacheError> =
            cache.get_or_render("page:/", || async { Ok("v1".to_string()) }).await;

        assert_eq!(cache.clear().await.unwrap(), 1);

        let fresh: Result<String, CacheError> =
            cache.get_or_render("page:/", || async { Ok("v2".to_string()) }).await;
        assert_eq!(fresh.unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_render_failure_is_not_cached() {
        let cache = page_cache();
        let failed: Result<String, CacheError> = cache
            .get_or_render("page:/", || async {
                Err(CacheError::Operation("render failed".into()))
            })
            .await;
        assert!(failed.is_err());

        let ok: Result<String, CacheError> =
            cache.get_or_render("page:/", || async { Ok("v1".to_string()) }).await;
        assert_eq!(ok.unwrap(), "v1");
    }
}
