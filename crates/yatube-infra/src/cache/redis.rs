//! Redis-backed cache, for page caching shared across server processes.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use yatube_core::ports::{Cache, CacheError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prepended to every key so several deployments can share one Redis.
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            namespace: "yatube:".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            namespace: std::env::var("REDIS_NAMESPACE").unwrap_or_else(|_| "yatube:".to_string()),
        }
    }
}

/// Redis-backed cache implementation.
///
/// Uses connection manager for automatic reconnection. Expiry is left to
/// Redis (`SET EX`), so TTLs are rounded up to whole seconds.
pub struct RedisCache {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis cache");

        Ok(Self { conn, config })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, CacheError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.config.namespace, key)
    }
}

/// Whole seconds for `SET EX`, never zero.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.namespaced(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.namespaced(key);

        match ttl {
            Some(duration) => {
                conn.set_ex::<_, _, ()>(key, value, ttl_secs(duration))
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))?;
            }
            None => {
                conn.set::<_, _, ()>(key, value)
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.namespaced(key))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(self.namespaced(key))
            .await
            .unwrap_or(false)
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.namespaced(prefix));
        let keys = conn
            .keys::<_, Vec<String>>(&pattern)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;

        if keys.is_empty() {
            return Ok(0);
        }

        let removed = keys.len();
        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        tracing::debug!(pattern = %pattern, removed, "Cleared Redis cache entries");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn get_test_cache() -> Option<RedisCache> {
        let config = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            namespace: format!("yatube-test-{}:", std::process::id()),
        };

        RedisCache::new(config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_cache_set_get() {
        let cache = match get_test_cache().await {
            Some(c) => c,
            None => {
                tracing::warn!("Redis not available, skipping test");
                return;
            }
        };

        let key = "page:/";
        let value = "{\"title\":\"Latest updates\"}";

        cache.set(key, value, None).await.unwrap();
        assert_eq!(cache.get(key).await, Some(value.to_string()));

        cache.delete(key).await.unwrap();
        assert_eq!(cache.get(key).await, None);
    }

    #[tokio::test]
    async fn test_redis_cache_ttl() {
        let cache = match get_test_cache().await {
            Some(c) => c,
            None => return,
        };

        let key = "page:/?page=2";
        let value = "{}";

        // Set with 1s TTL
        cache
            .set(key, value, Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(cache.get(key).await, Some(value.to_string()));

        // Wait for expiration
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(cache.get(key).await, None);
    }

    #[tokio::test]
    async fn test_redis_cache_clear_prefix() {
        let cache = match get_test_cache().await {
            Some(c) => c,
            None => return,
        };

        cache.set("page:/", "a", None).await.unwrap();
        cache.set("page:/?page=3", "b", None).await.unwrap();
        cache.set("session:x", "c", None).await.unwrap();

        assert_eq!(cache.clear_prefix("page:").await.unwrap(), 2);
        assert_eq!(cache.get("page:/").await, None);
        assert_eq!(cache.get("session:x").await, Some("c".to_string()));

        cache.delete("session:x").await.unwrap();
    }

    #[test]
    fn test_ttl_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_secs(20)), 20);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
    }
}
