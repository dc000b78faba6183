//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use yatube_core::page_cache::PAGE_CACHE_TTL;
use yatube_infra::JwtConfig;

#[cfg(feature = "postgres")]
use yatube_infra::DatabaseConfig;
#[cfg(feature = "redis")]
use yatube_infra::RedisConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    /// `None` keeps cached pages in process memory.
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub page_cache_ttl: Duration,
    pub jwt: JwtConfig,
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        #[cfg(feature = "postgres")]
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
                min_connections: parsed("DB_MIN_CONNECTIONS").unwrap_or(defaults.min_connections),
                sqlx_logging: parsed("DB_LOG_SQL").unwrap_or(defaults.sqlx_logging),
                ..defaults
            }
        });

        #[cfg(feature = "redis")]
        let redis = env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env());

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT").unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database,
            #[cfg(feature = "redis")]
            redis,
            page_cache_ttl: parsed("PAGE_CACHE_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(PAGE_CACHE_TTL),
            jwt: JwtConfig::from_env(),
        }
    }
}
