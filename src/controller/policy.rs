//! # Sync Policy
//!
//! Decides whether a cluster namespace is synchronized to Vault.
//!
//! Precedence, evaluated in this order:
//!
//! 1. System namespaces (`kube-*`, `openshift*`, `default`) are opt-in only:
//!    they sync only if they also match an include pattern.
//! 2. A name matching an exclude pattern does not sync.
//! 3. With include patterns configured, a name syncs only if it matches one.
//! 4. Everything else syncs.

use super::matcher::PatternSet;
use crate::constants::DEFAULT_SYSTEM_NAMESPACE_PATTERNS;

#[derive(Debug, Clone)]
pub struct SyncPolicy {
    include: PatternSet,
    exclude: PatternSet,
    system: PatternSet,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), Vec::<String>::new())
    }
}

impl SyncPolicy {
    /// Build a policy with the default system namespace patterns
    pub fn new<I, E, S>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_system_patterns(include, exclude, DEFAULT_SYSTEM_NAMESPACE_PATTERNS.iter().copied())
    }

    pub fn with_system_patterns<I, E, Y, S, T>(include: I, exclude: E, system: Y) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        Y: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            include: PatternSet::new(include),
            exclude: PatternSet::new(exclude),
            system: PatternSet::new(system),
        }
    }

    #[must_use]
    pub fn should_sync(&self, name: &str) -> bool {
        if self.system.matches(name) {
            return self.include.matches(name);
        }
        if self.exclude.matches(name) {
            return false;
        }
        if !self.include.is_empty() {
            return self.include.matches(name);
        }
        true
    }

    /// Count how many of `names` are managed and how many are excluded
    pub fn partition<'a, I>(&self, names: I) -> (usize, usize)
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .fold((0, 0), |(managed, excluded), name| {
                if self.should_sync(name) {
                    (managed + 1, excluded)
                } else {
                    (managed, excluded + 1)
                }
            })
    }

    #[must_use]
    pub fn include_patterns(&self) -> &[String] {
        self.include.sources()
    }

    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        self.exclude.sources()
    }

    #[must_use]
    pub fn system_patterns(&self) -> &[String] {
        self.system.sources()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(include: &[&str], exclude: &[&str]) -> SyncPolicy {
        SyncPolicy::new(include.to_vec(), exclude.to_vec())
    }

    #[test]
    fn test_system_namespace_not_synced_by_default() {
        let p = policy(&[], &[]);
        for name in ["kube-system", "kube-public", "openshift", "openshift-monitoring", "default"] {
            assert!(!p.should_sync(name), "{name} should not sync");
        }
    }

    #[test]
    fn test_system_namespace_explicitly_included() {
        let p = policy(&["kube-.*"], &[]);
        assert!(p.should_sync("kube-system"));
        assert!(!p.should_sync("default"));
    }

    #[test]
    fn test_system_check_runs_before_exclude() {
        // Included system namespaces sync even when an exclude pattern also matches
        let p = policy(&["^kube-system$"], &["^kube-.*"]);
        assert!(p.should_sync("kube-system"));
        assert!(!p.should_sync("kube-public"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let p = policy(&["^team-.*"], &["^team-legacy$"]);
        assert!(p.should_sync("team-a"));
        assert!(!p.should_sync("team-legacy"));
    }

    #[test]
    fn test_namespace_matching_exclude_pattern() {
        assert!(!policy(&[], &["test-.*"]).should_sync("test-ns"));
    }

    #[test]
    fn test_include_patterns_restrict() {
        let p = policy(&["prod-.*"], &[]);
        assert!(!p.should_sync("test-ns"));
        assert!(p.should_sync("prod-ns"));
    }

    #[test]
    fn test_regular_namespace_synced_by_default() {
        let p = policy(&[], &[]);
        for name in ["app-namespace", "payments", "kubeflow", "defaults"] {
            assert!(p.should_sync(name), "{name} should sync");
        }
    }

    #[test]
    fn test_custom_system_patterns() {
        let p = SyncPolicy::with_system_patterns(Vec::<String>::new(), Vec::<String>::new(), ["^infra-.*"]);
        assert!(!p.should_sync("infra-dns"));
        assert!(p.should_sync("kube-system"));
    }

    #[test]
    fn test_partition_counts() {
        let p = policy(&[], &["^scratch$"]);
        let (managed, excluded) = p.partition(["app", "kube-system", "scratch", "web"]);
        assert_eq!((managed, excluded), (2, 2));
    }
}
