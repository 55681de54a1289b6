//! Redis cache backend

use async_trait::async_trait;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::CacheBackend;
use crate::error::{AccessError, Result};

/// Default per-command timeout
pub const DEFAULT_REDIS_TIMEOUT: Duration = Duration::from_millis(250);

/// Redis-backed cache shared between service instances
///
/// Every command runs under a timeout so a stalled Redis degrades to a cache
/// miss instead of blocking resolution.
#[derive(Clone)]
pub struct RedisCacheBackend {
    client: redis::Client,
    timeout: Duration,
}

impl RedisCacheBackend {
    /// Create a backend for the given Redis URL. No connection is made until
    /// the first command.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AccessError::Cache(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            timeout: DEFAULT_REDIS_TIMEOUT,
        })
    }

    /// Set the per-command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(redis::aio::MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let command = async {
            match self.client.get_multiplexed_async_connection().await {
                Ok(conn) => op(conn).await,
                Err(e) => Err(e),
            }
        };

        match timeout(self.timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AccessError::Cache(e.to_string())),
            Err(_) => Err(AccessError::Cache("redis timeout".to_string())),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.run(|mut conn| async move { conn.get(key).await }).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        // SET EX takes whole seconds and rejects zero
        let secs = ttl.as_secs().max(1);
        self.run(|mut conn| async move { conn.set_ex(key, value, secs).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.run(|mut conn| async move { conn.del(key).await }).await
    }
}
