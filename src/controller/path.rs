//! # Vault Namespace Paths
//!
//! Derives the Vault namespace path for a cluster namespace from the configured
//! format template and optional namespace root.
//!
//! Derivation is a pure function of `(name, format, namespace_root)`.

use crate::constants::{DEFAULT_NAMESPACE_FORMAT, NAMESPACE_FORMAT_SLOT};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("namespace format {format:?} must contain exactly one %s placeholder, found {found}")]
    SlotCount { format: String, found: usize },
}

/// A Vault namespace path such as `admin/k8s-payments`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacePath(String);

impl NamespacePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the parent namespace and the last segment.
    ///
    /// Surrounding slashes are ignored. A top-level path has an empty parent.
    #[must_use]
    pub fn split(&self) -> (&str, &str) {
        let clean = self.0.trim_matches('/');
        match clean.rsplit_once('/') {
            Some((parent, child)) => (parent.trim_end_matches('/'), child),
            None => ("", clean),
        }
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NamespacePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Format template plus optional root under which all namespaces are created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    format: String,
    namespace_root: Option<String>,
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self {
            format: DEFAULT_NAMESPACE_FORMAT.to_string(),
            namespace_root: None,
        }
    }
}

impl PathTemplate {
    /// Build a template. An empty format means the name is used unchanged.
    ///
    /// A root that is empty after trimming slashes is treated as no root.
    pub fn new(format: &str, namespace_root: Option<&str>) -> Result<Self, TemplateError> {
        let format = if format.is_empty() {
            DEFAULT_NAMESPACE_FORMAT
        } else {
            format
        };

        let found = format.matches(NAMESPACE_FORMAT_SLOT).count();
        if found != 1 {
            return Err(TemplateError::SlotCount {
                format: format.to_string(),
                found,
            });
        }

        let namespace_root = namespace_root
            .map(|root| root.trim_matches('/'))
            .filter(|root| !root.is_empty())
            .map(str::to_string);

        Ok(Self {
            format: format.to_string(),
            namespace_root,
        })
    }

    /// Derive the Vault path for `name`.
    ///
    /// A blank name has no path of its own. Under a root it would otherwise
    /// resolve to the root namespace itself.
    #[must_use]
    pub fn format_path(&self, name: &str) -> Option<NamespacePath> {
        if name.trim().is_empty() {
            return None;
        }
        let formatted = self.format.replacen(NAMESPACE_FORMAT_SLOT, name, 1);

        let Some(root) = &self.namespace_root else {
            return Some(NamespacePath(formatted));
        };

        let relative = formatted.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        Some(NamespacePath(format!("{root}/{relative}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(name: &str, format: &str, root: Option<&str>) -> String {
        PathTemplate::new(format, root)
            .unwrap()
            .format_path(name)
            .unwrap()
            .as_str()
            .to_string()
    }

    #[test]
    fn test_format_without_root() {
        assert_eq!(path("test-ns", "k8s-%s", None), "k8s-test-ns");
        assert_eq!(path("test-ns", "k8s-%s", Some("")), "k8s-test-ns");
        assert_eq!(path("test-ns", "kubernetes-%s-ns", None), "kubernetes-test-ns-ns");
    }

    #[test]
    fn test_format_with_root() {
        assert_eq!(path("test-ns", "k8s-%s", Some("/admin")), "admin/k8s-test-ns");
        assert_eq!(path("test-ns", "k8s-%s", Some("/admin/")), "admin/k8s-test-ns");
        assert_eq!(path("test-ns", "k8s-%s", Some("admin/teams")), "admin/teams/k8s-test-ns");
    }

    #[test]
    fn test_leading_slash_in_formatted_name_with_root() {
        assert_eq!(path("test-ns", "/k8s-%s", Some("/admin")), "admin/k8s-test-ns");
    }

    #[test]
    fn test_formatted_unchanged_without_root() {
        assert_eq!(path("test-ns", "/k8s-%s/", None), "/k8s-test-ns/");
    }

    #[test]
    fn test_blank_name_has_no_path() {
        let rooted = PathTemplate::new("%s", Some("/admin/")).unwrap();
        assert_eq!(rooted.format_path(""), None);
        assert_eq!(rooted.format_path("  "), None);
        assert_eq!(PathTemplate::new("/%s", Some("admin")).unwrap().format_path(""), None);
        assert_eq!(PathTemplate::new("%s", None).unwrap().format_path(""), None);
    }

    #[test]
    fn test_format_of_only_slashes_under_root_has_no_path() {
        let template = PathTemplate::new("/%s", Some("admin")).unwrap();
        assert_eq!(template.format_path("/"), None);
    }

    #[test]
    fn test_empty_format_defaults_to_name() {
        assert_eq!(path("payments", "", None), "payments");
    }

    #[test]
    fn test_root_of_only_slashes_is_no_root() {
        assert_eq!(path("test-ns", "k8s-%s", Some("/")), "k8s-test-ns");
    }

    #[test]
    fn test_slot_count_validation() {
        assert_eq!(
            PathTemplate::new("k8s", None),
            Err(TemplateError::SlotCount {
                format: "k8s".to_string(),
                found: 0
            })
        );
        assert!(PathTemplate::new("%s-%s", None).is_err());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let template = PathTemplate::new("k8s-%s", Some("admin")).unwrap();
        assert_eq!(template.format_path("a"), template.format_path("a"));
    }

    #[test]
    fn test_split() {
        assert_eq!(NamespacePath::new("payments").split(), ("", "payments"));
        assert_eq!(NamespacePath::new("admin/payments").split(), ("admin", "payments"));
        assert_eq!(NamespacePath::new("/a/b/c/").split(), ("a/b", "c"));
        assert_eq!(NamespacePath::new("").split(), ("", ""));
    }
}
