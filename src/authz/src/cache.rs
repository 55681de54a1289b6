//! Role-access map caching
//!
//! The full role → (allowed, disallowed) map is kept as one JSON value under a
//! single key in a [`CacheBackend`]. The backend is an optimization: when it
//! fails or holds an undecodable value, the map is rebuilt from the
//! [`RoleStore`].

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};
use crate::store::RoleStore;
use crate::types::RoleAccessMap;

#[cfg(feature = "redis")]
pub mod redis_backend;

#[cfg(feature = "redis")]
pub use redis_backend::RedisCacheBackend;

/// Default cache key for the serialized role-access map
pub const DEFAULT_CACHE_KEY: &str = "roleAccessMap";

/// Default time-to-live for the cached map
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Key-value cache backend
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read a value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value that expires after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a value
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Cached value with TTL
#[derive(Clone)]
struct CachedEntry {
    value: String,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// In-process cache backend (thread-safe, TTL-expiring)
#[derive(Clone, Default)]
pub struct InMemoryCacheBackend {
    entries: Arc<DashMap<String, CachedEntry>>,
}

impl InMemoryCacheBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live and not-yet-evicted entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), CachedEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Loads the role-access map from storage and keeps it in a cache backend
///
/// There is no lock around a miss: concurrent callers may each rebuild the
/// map and write it back. The rebuild is idempotent, so the last write wins
/// with the same value.
pub struct RoleAccessCache {
    /// Source of truth for role definitions
    store: Arc<dyn RoleStore>,

    /// Key-value backend holding the serialized map
    backend: Arc<dyn CacheBackend>,

    /// Cache key for the serialized map
    key: String,

    /// Time-to-live of the cached map
    ttl: Duration,

    /// Cache statistics
    stats: Arc<DashMap<String, usize>>,
}

impl RoleAccessCache {
    /// Create a cache with the default key
    pub fn new(store: Arc<dyn RoleStore>, backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        info!("RoleAccessCache initialized with ttl={}s", ttl.as_secs());

        Self {
            store,
            backend,
            key: DEFAULT_CACHE_KEY.to_string(),
            ttl,
            stats: Arc::new(DashMap::new()),
        }
    }

    /// Create a cache from configuration
    pub fn from_config(
        config: &AccessConfig,
        store: Arc<dyn RoleStore>,
        backend: Arc<dyn CacheBackend>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(store, backend, config.ttl()).with_key(config.cache_key.clone()))
    }

    /// Use a different cache key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The cache key in use
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the current role-access map
    ///
    /// Served from the backend when present; otherwise rebuilt from storage
    /// and written back with the configured TTL. A cached value is trusted
    /// as-is until it expires.
    ///
    /// # Errors
    ///
    /// [`AccessError::StorageUnavailable`] when a rebuild is needed and the
    /// store cannot be queried. Backend failures never surface here.
    pub async fn get_role_access_map(&self) -> Result<RoleAccessMap> {
        match self.backend.get(&self.key).await {
            Ok(Some(raw)) => match serde_json::from_str::<RoleAccessMap>(&raw) {
                Ok(map) => {
                    self.increment_stat("hits");
                    debug!("Role-access map cache hit ({} roles)", map.len());
                    return Ok(map);
                }
                Err(e) => {
                    self.increment_stat("decode_errors");
                    warn!("Discarding undecodable role-access map under {:?}: {}", self.key, e);
                }
            },
            Ok(None) => {
                self.increment_stat("misses");
                debug!("Role-access map cache miss");
            }
            Err(e) => {
                self.increment_stat("backend_errors");
                warn!("Role-access cache read failed, falling back to storage: {}", e);
            }
        }

        self.rebuild().await
    }

    /// Drop the cached map so the next call rebuilds from storage
    ///
    /// Call after creating, updating or deleting a role record.
    pub async fn invalidate(&self) -> Result<()> {
        self.backend.delete(&self.key).await?;
        self.increment_stat("invalidations");
        debug!("Role-access map invalidated");
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            backend_errors: self.get_stat("backend_errors"),
            decode_errors: self.get_stat("decode_errors"),
            write_errors: self.get_stat("write_errors"),
            rebuilds: self.get_stat("rebuilds"),
            invalidations: self.get_stat("invalidations"),
        }
    }

    async fn rebuild(&self) -> Result<RoleAccessMap> {
        let records = self.store.list_roles().await.map_err(|e| match e {
            AccessError::StorageUnavailable(_) => e,
            other => AccessError::StorageUnavailable(other.to_string()),
        })?;

        let map = RoleAccessMap::from_records(records);
        self.increment_stat("rebuilds");
        debug!("Rebuilt role-access map from storage ({} roles)", map.len());

        if let Err(e) = self.write_back(&map).await {
            self.increment_stat("write_errors");
            warn!("Role-access cache write failed: {}", e);
        }

        Ok(map)
    }

    async fn write_back(&self, map: &RoleAccessMap) -> Result<()> {
        let raw = serde_json::to_string(map)?;
        self.backend.set(&self.key, &raw, self.ttl).await
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub backend_errors: usize,
    pub decode_errors: usize,
    pub write_errors: usize,
    pub rebuilds: usize,
    pub invalidations: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.backend_errors + self.decode_errors;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRoleStore;
    use crate::types::RoleRecord;

    fn test_store() -> Arc<InMemoryRoleStore> {
        Arc::new(InMemoryRoleStore::with_roles(vec![
            RoleRecord::new("faculty").allow("handout:*"),
            RoleRecord::new("student").allow("conference:apply"),
        ]))
    }

    #[tokio::test]
    async fn test_backend_ttl() {
        let backend = InMemoryCacheBackend::new();
        backend
            .set("k", "v", Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_backend_delete() {
        let backend = InMemoryCacheBackend::new();
        backend.set("k", "v", DEFAULT_TTL).await.unwrap();
        backend.delete("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = RoleAccessCache::new(test_store(), backend.clone(), DEFAULT_TTL);

        let first = cache.get_role_access_map().await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(backend.get(DEFAULT_CACHE_KEY).await.unwrap().is_some());

        let second = cache.get_role_access_map().await.unwrap();
        assert_eq!(first, second);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.rebuilds, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_undecodable_value_is_rebuilt() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        backend
            .set(DEFAULT_CACHE_KEY, "not json", DEFAULT_TTL)
            .await
            .unwrap();

        let cache = RoleAccessCache::new(test_store(), backend.clone(), DEFAULT_TTL);
        let map = cache.get_role_access_map().await.unwrap();

        assert!(map.contains("faculty"));
        assert_eq!(cache.stats().decode_errors, 1);

        let raw = backend.get(DEFAULT_CACHE_KEY).await.unwrap().unwrap();
        assert!(serde_json::from_str::<RoleAccessMap>(&raw).is_ok());
    }

    #[tokio::test]
    async fn test_custom_key() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = RoleAccessCache::new(test_store(), backend.clone(), DEFAULT_TTL)
            .with_key("deptms:roles");

        cache.get_role_access_map().await.unwrap();

        assert_eq!(cache.key(), "deptms:roles");
        assert!(backend.get("deptms:roles").await.unwrap().is_some());
        assert!(backend.get(DEFAULT_CACHE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_config_rejects_zero_ttl() {
        let config = AccessConfig {
            ttl_secs: 0,
            ..Default::default()
        };

        let result = RoleAccessCache::from_config(
            &config,
            test_store(),
            Arc::new(InMemoryCacheBackend::new()),
        );
        assert!(matches!(result, Err(AccessError::Config(_))));
    }
}
