//! Persistent role storage

use crate::error::{AccessError, Result};
use crate::types::{RoleName, RoleRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresRoleStore;

/// Role store trait
///
/// The source of truth for role definitions. Failures must surface as
/// [`AccessError::StorageUnavailable`].
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// List every role record
    async fn list_roles(&self) -> Result<Vec<RoleRecord>>;
}

#[async_trait]
impl<S: RoleStore + ?Sized> RoleStore for Arc<S> {
    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        (**self).list_roles().await
    }
}

/// In-memory role store implementation
pub struct InMemoryRoleStore {
    roles: Arc<RwLock<HashMap<RoleName, RoleRecord>>>,
    available: Arc<RwLock<bool>>,
}

impl InMemoryRoleStore {
    /// Create an empty in-memory role store
    pub fn new() -> Self {
        Self {
            roles: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(RwLock::new(true)),
        }
    }

    /// Create a store seeded with roles
    pub fn with_roles(roles: impl IntoIterator<Item = RoleRecord>) -> Self {
        let roles = roles
            .into_iter()
            .map(|role| (role.name.clone(), role))
            .collect();

        Self {
            roles: Arc::new(RwLock::new(roles)),
            available: Arc::new(RwLock::new(true)),
        }
    }

    /// Insert or replace a role
    pub async fn put(&self, role: RoleRecord) {
        let mut roles = self.roles.write().await;
        roles.insert(role.name.clone(), role);
    }

    /// Remove a role
    pub async fn remove(&self, name: &str) -> Option<RoleRecord> {
        let mut roles = self.roles.write().await;
        roles.remove(name)
    }

    /// Simulate the store going down or coming back
    pub async fn set_available(&self, available: bool) {
        *self.available.write().await = available;
    }
}

impl Default for InMemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        if !*self.available.read().await {
            return Err(AccessError::StorageUnavailable(
                "in-memory role store is offline".to_string(),
            ));
        }

        let roles = self.roles.read().await;
        Ok(roles.values().cloned().collect())
    }
}
