//! Wildcard matching for permission patterns
//!
//! A `*` in a pattern matches any run of characters, including the empty run
//! and separators such as `:` or `/`. The match is anchored at both ends, so
//! `project:*` matches `project:view-all` but not `project`.
//!
//! There is no escape for a literal `*`. Every other character is literal:
//! `a.b` matches only `a.b`, never `axb`.

use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

const WILDCARD: char = '*';

/// Check whether `resource` is matched by `pattern`
///
/// # Examples
///
/// ```
/// use deptms_authz::pattern::matches;
///
/// assert!(matches("project:view-all", "project:*"));
/// assert!(!matches("project", "project:*"));
/// ```
pub fn matches(resource: &str, pattern: &str) -> bool {
    if !pattern.contains(WILDCARD) {
        return resource == pattern;
    }
    if pattern.chars().all(|c| c == WILDCARD) {
        return true;
    }

    match compile(pattern) {
        Some(regex) => regex.is_match(resource),
        None => resource == pattern,
    }
}

/// Compile a pattern into an anchored regex, escaping everything but `*`
fn compile(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    match Regex::new(&format!("(?s)^{}$", body)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Permission pattern {:?} could not be compiled: {}", pattern, e);
            None
        }
    }
}

/// Wildcard matcher that keeps compiled patterns for reuse
///
/// Results are identical to [`matches`]. The matcher is cheap to clone and
/// safe to share across tasks.
#[derive(Clone, Default)]
pub struct WildcardMatcher {
    compiled: Arc<DashMap<String, Option<Regex>>>,
}

impl WildcardMatcher {
    /// Create an empty matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `resource` is matched by `pattern`
    pub fn matches(&self, resource: &str, pattern: &str) -> bool {
        if !pattern.contains(WILDCARD) {
            return resource == pattern;
        }

        if let Some(entry) = self.compiled.get(pattern) {
            return match entry.value() {
                Some(regex) => regex.is_match(resource),
                None => resource == pattern,
            };
        }

        let regex = compile(pattern);
        let matched = match &regex {
            Some(regex) => regex.is_match(resource),
            None => resource == pattern,
        };
        self.compiled.insert(pattern.to_string(), regex);
        matched
    }

    /// Whether any of `patterns` matches `resource`
    pub fn matches_any<'a, I>(&self, resource: &str, patterns: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        patterns.into_iter().any(|p| self.matches(resource, p))
    }

    /// Number of compiled patterns held
    pub fn compiled_len(&self) -> usize {
        self.compiled.len()
    }

    /// Drop all compiled patterns
    pub fn clear(&self) {
        self.compiled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matching() {
        assert!(matches("a:b", "a:b"));
        assert!(!matches("a:b", "a:c"));
        assert!(!matches("a:b", "a:b:c"));
    }

    #[test]
    fn test_glob_is_anchored() {
        assert!(matches("project:view-all", "project:*"));
        assert!(matches("project:", "project:*"));
        assert!(!matches("project", "project:*"));
        assert!(!matches("my-project:view", "project:*"));
    }

    #[test]
    fn test_wildcard_crosses_separators() {
        assert!(matches("phd:student:42:review", "phd:*:review"));
        assert!(matches("handout/2024/cs101.pdf", "handout/*"));
        assert!(matches("qp-review:view", "*:view"));
        assert!(matches("x", "*x*"));
    }

    #[test]
    fn test_multiple_wildcards() {
        assert!(matches("conference:123:approve", "conference:*:*"));
        assert!(matches("conference::", "conference:*:*"));
        assert!(!matches("conference:123", "conference:*:*"));
    }

    #[test]
    fn test_lone_wildcard_matches_everything() {
        assert!(matches("", "*"));
        assert!(matches("anything at all", "*"));
        assert!(matches("line\nbreak", "**"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(matches("", ""));
        assert!(!matches("a", ""));
        assert!(!matches("", "a"));
        assert!(matches("", "*"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("a.b", "a.b*"));
        assert!(!matches("axb", "a.b*"));
        assert!(matches("report(1)+[x]", "report(*)+[x]"));
        assert!(!matches("reportttt", "report+*"));
        assert!(matches("cost$", "cost$*"));
        assert!(matches("a|b", "a|*"));
        assert!(!matches("b", "a|*"));
    }

    #[test]
    fn test_wildcard_matches_newlines() {
        assert!(matches("inventory:\nitem", "inventory:*"));
    }

    #[test]
    fn test_matcher_agrees_with_free_function() {
        let matcher = WildcardMatcher::new();
        let cases = [
            ("project:view-all", "project:*"),
            ("project", "project:*"),
            ("a.b", "a.*"),
            ("axb", "a.b"),
            ("", "*"),
            ("x:y", "x:y"),
        ];

        for (resource, pattern) in cases {
            assert_eq!(
                matcher.matches(resource, pattern),
                matches(resource, pattern),
                "{} vs {}",
                resource,
                pattern
            );
        }
    }

    #[test]
    fn test_matcher_compiles_each_pattern_once() {
        let matcher = WildcardMatcher::new();

        assert!(matcher.matches("project:a", "project:*"));
        assert!(matcher.matches("project:b", "project:*"));
        assert!(!matcher.matches("inventory:a", "project:*"));
        // Literal patterns never reach the regex path
        assert!(matcher.matches("x:y", "x:y"));

        assert_eq!(matcher.compiled_len(), 1);

        matcher.clear();
        assert_eq!(matcher.compiled_len(), 0);
    }

    #[test]
    fn test_matches_any() {
        let matcher = WildcardMatcher::new();
        let patterns = vec!["inventory:*".to_string(), "project:view".to_string()];

        assert!(matcher.matches_any("project:view", &patterns));
        assert!(matcher.matches_any("inventory:add", &patterns));
        assert!(!matcher.matches_any("project:edit", &patterns));
        assert!(!matcher.matches_any("project:edit", &Vec::new()));
    }
}
