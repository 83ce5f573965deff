//! # Pattern Matcher
//!
//! Evaluates namespace names against ordered sets of regular expressions.
//!
//! Patterns use unanchored search semantics: `kube-.*` matches `kube-system`
//! and also `my-kube-ns`. Anchor explicitly (`^kube-.*`) when a prefix match is
//! intended.
//!
//! A malformed pattern never aborts evaluation. It is logged once when the
//! set is compiled and then behaves as a non-match. Configuration validation
//! rejects malformed patterns before a `PatternSet` is ever built, so this only
//! matters for sets constructed directly.

use regex::Regex;
use tracing::warn;

/// Returns true if `name` matches at least one of the raw `patterns`.
///
/// Each pattern is compiled on every call; use [`PatternSet`] on hot paths.
#[must_use]
pub fn matches(name: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| Regex::new(pattern).is_ok_and(|re| re.is_match(name)))
}

/// An ordered, precompiled set of namespace patterns
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Option<Regex>>,
    sources: Vec<String>,
}

impl PatternSet {
    /// Compile `patterns` in order. Malformed entries are kept as permanent non-matches.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let patterns = sources
            .iter()
            .map(|source| match Regex::new(source) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %source, error = %e, "Ignoring malformed namespace pattern");
                    None
                }
            })
            .collect();

        Self { patterns, sources }
    }

    /// Returns true if `name` matches any compiled pattern in the set
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .flatten()
            .any(|re| re.is_match(name))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// The patterns as they were configured, malformed ones included
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}
