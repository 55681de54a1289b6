//! Access resolution for a list of roles
//!
//! Merges the allow/deny patterns of every known role into one [`Access`].
//!
//! # Ordering
//!
//! The merge is order-dependent. Roles are processed in input order and, for
//! each role, its `disallowed` patterns are checked *before* its own
//! `allowed` patterns are merged:
//!
//! - a disallow already covered by an allow from an **earlier** role is dropped;
//! - a disallow covered only by the **same** role's allow, or by a **later**
//!   role's allow, is kept.
//!
//! Callers that need reproducible results should pass roles in a canonical
//! order.
//!
//! # Example
//!
//! ```rust
//! use deptms_authz::resolver::resolve;
//! use deptms_authz::types::{RoleAccessMap, RoleRecord};
//!
//! let map = RoleAccessMap::from_records(vec![
//!     RoleRecord::new("faculty").allow("handout:*"),
//!     RoleRecord::new("guest").disallow("handout:edit"),
//! ]);
//!
//! let access = resolve(&map, &["faculty", "guest"]);
//! assert_eq!(access.allowed, vec!["handout:*"]);
//! assert!(access.disallowed.is_empty());
//!
//! let access = resolve(&map, &["guest", "faculty"]);
//! assert_eq!(access.disallowed, vec!["handout:edit"]);
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::cache::RoleAccessCache;
use crate::error::Result;
use crate::pattern::WildcardMatcher;
use crate::types::{Access, PermissionPattern, RoleAccessMap};

/// Insertion-ordered set of patterns
#[derive(Default)]
struct PatternSet {
    items: Vec<PermissionPattern>,
    seen: HashSet<PermissionPattern>,
}

impl PatternSet {
    fn insert(&mut self, pattern: &str) {
        if self.seen.insert(pattern.to_string()) {
            self.items.push(pattern.to_string());
        }
    }

    fn into_vec(self) -> Vec<PermissionPattern> {
        self.items
    }
}

/// Merge the rules of `roles` from a map snapshot
///
/// Unknown role names contribute nothing. See the module docs for the
/// ordering rules.
pub fn resolve<S: AsRef<str>>(map: &RoleAccessMap, roles: &[S]) -> Access {
    merge(&WildcardMatcher::new(), map, roles)
}

fn merge<S: AsRef<str>>(matcher: &WildcardMatcher, map: &RoleAccessMap, roles: &[S]) -> Access {
    let mut allowed = PatternSet::default();
    let mut disallowed = PatternSet::default();

    for role in roles {
        let Some(rules) = map.get(role.as_ref()) else {
            continue;
        };

        // Checked against allows from earlier roles only
        for pattern in &rules.disallowed {
            if !matcher.matches_any(pattern, &allowed.items) {
                disallowed.insert(pattern);
            }
        }

        for pattern in &rules.allowed {
            allowed.insert(pattern);
        }
    }

    Access {
        allowed: allowed.into_vec(),
        disallowed: disallowed.into_vec(),
    }
}

/// Resolves role lists into access using the cached role-access map
///
/// # Thread Safety
///
/// The resolver holds no per-call state and can be shared across tasks
/// using `Arc`.
pub struct AccessResolver {
    /// Role-access map source
    cache: Arc<RoleAccessCache>,

    /// Compiled permission patterns, reused across calls
    matcher: WildcardMatcher,
}

impl AccessResolver {
    /// Create a resolver over a role-access cache
    pub fn new(cache: Arc<RoleAccessCache>) -> Self {
        Self {
            cache,
            matcher: WildcardMatcher::new(),
        }
    }

    /// The underlying role-access cache
    pub fn cache(&self) -> &Arc<RoleAccessCache> {
        &self.cache
    }

    /// Resolve the effective access for `roles`
    ///
    /// An empty role list resolves to empty access without touching the
    /// cache or storage.
    ///
    /// # Errors
    ///
    /// [`crate::AccessError::StorageUnavailable`] when the role-access map
    /// has to be rebuilt and storage cannot be queried.
    pub async fn get_access<S: AsRef<str>>(&self, roles: &[S]) -> Result<Access> {
        if roles.is_empty() {
            return Ok(Access::empty());
        }

        let map = self.cache.get_role_access_map().await?;
        let access = self.resolve(&map, roles);

        debug!(
            "Resolved {} roles: {} allowed, {} disallowed",
            roles.len(),
            access.allowed.len(),
            access.disallowed.len()
        );

        Ok(access)
    }

    /// Resolve against an already loaded map
    pub fn resolve<S: AsRef<str>>(&self, map: &RoleAccessMap, roles: &[S]) -> Access {
        merge(&self.matcher, map, roles)
    }

    /// Resolve `roles` and check a single resource against the result
    pub async fn permits<S: AsRef<str>>(&self, roles: &[S], resource: &str) -> Result<bool> {
        let access = self.get_access(roles).await?;
        Ok(access.permits(resource))
    }
}
