//! # Departmental Access Resolution
//!
//! Role-based access control for the departmental information system.
//!
//! ## Features
//!
//! - **Wildcard permission patterns** (`project:*`, `phd:*:review`)
//! - **Role merging** with allow/disallow override semantics
//! - **Cached role-access map** with TTL, in-process or Redis backed
//! - **PostgreSQL role store** using sqlx
//!
//! ## Example
//!
//! ```rust
//! use deptms_authz::{
//!     AccessResolver, InMemoryCacheBackend, InMemoryRoleStore, RoleAccessCache, RoleRecord,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRoleStore::with_roles(vec![
//!         RoleRecord::new("faculty").allow("handout:*").disallow("handout:delete"),
//!     ]));
//!     let cache = RoleAccessCache::new(
//!         store,
//!         Arc::new(InMemoryCacheBackend::new()),
//!         Duration::from_secs(300),
//!     );
//!     let resolver = AccessResolver::new(Arc::new(cache));
//!
//!     let access = resolver.get_access(&["faculty"]).await?;
//!
//!     assert!(access.permits("handout:upload"));
//!     assert!(!access.permits("handout:delete"));
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod pattern;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheBackend, CacheStats, InMemoryCacheBackend, RoleAccessCache};
pub use config::AccessConfig;
pub use error::{AccessError, Result};
pub use pattern::{matches, WildcardMatcher};
pub use resolver::AccessResolver;
pub use store::{InMemoryRoleStore, RoleStore};
pub use types::{Access, RoleAccessMap, RoleRecord, RoleRules};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
