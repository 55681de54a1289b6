//! Access resolution configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_KEY;
use crate::error::{AccessError, Result};

/// Configuration for the role-access cache and its backends
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessConfig {
    /// Lifetime of the cached role-access map, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Key under which the serialized map is cached
    #[serde(default = "default_cache_key")]
    pub cache_key: String,

    /// PostgreSQL connection string for the roles table
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection string; an in-process cache is used when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Per-command Redis timeout, in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub redis_timeout_ms: u64,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_string()
}

fn default_redis_timeout_ms() -> u64 {
    250
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            cache_key: default_cache_key(),
            database_url: None,
            redis_url: None,
            redis_timeout_ms: default_redis_timeout_ms(),
        }
    }
}

impl AccessConfig {
    /// Load configuration from environment variables
    ///
    /// - `ROLE_ACCESS_TTL` - cache TTL in seconds (default: 300)
    /// - `ROLE_ACCESS_CACHE_KEY` - cache key (default: roleAccessMap)
    /// - `DATABASE_URL` - PostgreSQL connection string
    /// - `REDIS_URL` - Redis connection string
    /// - `REDIS_TIMEOUT_MS` - Redis command timeout (default: 250)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ttl) = lookup("ROLE_ACCESS_TTL") {
            config.ttl_secs = parse_number("ROLE_ACCESS_TTL", &ttl)?;
        }
        if let Some(key) = lookup("ROLE_ACCESS_CACHE_KEY") {
            config.cache_key = key;
        }
        if let Some(timeout) = lookup("REDIS_TIMEOUT_MS") {
            config.redis_timeout_ms = parse_number("REDIS_TIMEOUT_MS", &timeout)?;
        }
        config.database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        config.redis_url = lookup("REDIS_URL").filter(|v| !v.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(AccessError::Config(
                "ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache_key.is_empty() {
            return Err(AccessError::Config("cache_key cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Cache TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Redis command timeout as a duration
    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| AccessError::Config(format!("{} must be a whole number: {}", name, e)))
}
