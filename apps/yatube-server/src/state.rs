//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use yatube_core::ports::{Cache, PasswordService, Repositories, TokenService};
use yatube_core::{FeedBuilder, PageCache};
use yatube_infra::{Argon2PasswordService, InMemoryCache, InMemoryStore, JwtConfig, JwtTokenService};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub feeds: FeedBuilder,
    pub page_cache: PageCache,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

impl AppState {
    /// Wire the state from already chosen backends.
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        page_cache_ttl: Duration,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            feeds: FeedBuilder::new(repos.clone()),
            repos,
            page_cache: PageCache::new(cache, page_cache_ttl),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    /// Build the application state, falling back to in-memory backends for
    /// anything that is not configured or not reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        let cache = Self::cache(config).await;

        tracing::info!(
            page_cache_ttl_secs = config.page_cache_ttl.as_secs(),
            "Application state initialized"
        );

        Self::from_parts(repos, cache, config.page_cache_ttl, config.jwt.clone())
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return InMemoryStore::new().repositories();
        };

        match yatube_infra::connect(db_config).await {
            Ok(conn) => yatube_infra::database::repositories(conn),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to connect to database. Using in-memory fallback."
                );
                InMemoryStore::new().repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory store");
        InMemoryStore::new().repositories()
    }

    #[cfg(feature = "redis")]
    async fn cache(config: &AppConfig) -> Arc<dyn Cache> {
        let Some(redis_config) = &config.redis else {
            return Arc::new(InMemoryCache::new());
        };

        match yatube_infra::RedisCache::new(redis_config.clone()).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to connect to Redis. Caching pages in memory."
                );
                Arc::new(InMemoryCache::new())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn cache(_config: &AppConfig) -> Arc<dyn Cache> {
        Arc::new(InMemoryCache::new())
    }
}
