//! Core access types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::pattern;

/// Unique role name
pub type RoleName = String;

/// Permission pattern, possibly containing `*` wildcards (e.g. "project:*")
pub type PermissionPattern = String;

/// Role record as read from persistent storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Role name (e.g. "faculty", "hod")
    pub name: RoleName,

    /// Patterns granted to holders of this role
    #[serde(default)]
    pub allowed: Vec<PermissionPattern>,

    /// Patterns denied to holders of this role
    #[serde(default)]
    pub disallowed: Vec<PermissionPattern>,
}

impl RoleRecord {
    /// Create a role with no patterns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: Vec::new(),
            disallowed: Vec::new(),
        }
    }

    /// Grant a pattern
    pub fn allow(mut self, pattern: impl Into<String>) -> Self {
        self.allowed.push(pattern.into());
        self
    }

    /// Deny a pattern
    pub fn disallow(mut self, pattern: impl Into<String>) -> Self {
        self.disallowed.push(pattern.into());
        self
    }
}

/// The allow/deny pattern lists of a single role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRules {
    #[serde(default)]
    pub allowed: Vec<PermissionPattern>,

    #[serde(default)]
    pub disallowed: Vec<PermissionPattern>,
}

impl From<RoleRecord> for RoleRules {
    fn from(record: RoleRecord) -> Self {
        Self {
            allowed: record.allowed,
            disallowed: record.disallowed,
        }
    }
}

/// Lookup table from role name to its rules
///
/// Serialized as a plain JSON object (`{"faculty": {"allowed": [...], "disallowed": [...]}}`)
/// so the cached form stays readable from other services sharing the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleAccessMap {
    roles: HashMap<RoleName, RoleRules>,
}

impl RoleAccessMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from storage records. A later record with the same name
    /// replaces an earlier one.
    pub fn from_records(records: impl IntoIterator<Item = RoleRecord>) -> Self {
        records.into_iter().collect()
    }

    /// Insert or replace a role
    pub fn insert(&mut self, name: impl Into<String>, rules: RoleRules) {
        self.roles.insert(name.into(), rules);
    }

    /// Rules for a role, if known
    pub fn get(&self, name: &str) -> Option<&RoleRules> {
        self.roles.get(name)
    }

    /// Whether the role is known
    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Number of roles
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Iterate over (role name, rules)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleRules)> {
        self.roles.iter().map(|(name, rules)| (name.as_str(), rules))
    }
}

impl FromIterator<RoleRecord> for RoleAccessMap {
    fn from_iter<I: IntoIterator<Item = RoleRecord>>(iter: I) -> Self {
        let mut map = Self::new();
        for record in iter {
            let name = record.name.clone();
            map.insert(name, record.into());
        }
        map
    }
}

/// Resolved access for a list of roles
///
/// Both lists are deduplicated and keep first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub allowed: Vec<PermissionPattern>,
    pub disallowed: Vec<PermissionPattern>,
}

impl Access {
    /// Access that grants nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.disallowed.is_empty()
    }

    /// Whether some allowed pattern matches the resource
    pub fn is_allowed(&self, resource: &str) -> bool {
        self.allowed.iter().any(|p| pattern::matches(resource, p))
    }

    /// Whether some disallowed pattern matches the resource
    pub fn is_disallowed(&self, resource: &str) -> bool {
        self.disallowed.iter().any(|p| pattern::matches(resource, p))
    }

    /// Enforcement check: granted iff an allowed pattern matches and no
    /// disallowed pattern does.
    pub fn permits(&self, resource: &str) -> bool {
        self.is_allowed(resource) && !self.is_disallowed(resource)
    }
}
