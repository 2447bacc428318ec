//! Inbound path matching.
//!
//! # Responsibilities
//! - Match path prefixes on segment boundaries (case-sensitive)
//! - Decide which requests skip classification (assets, API)
//!
//! # Design Decisions
//! - `/images` matches `/images` and `/images/a.png`, never `/imagesfoo`
//! - No regex; linear scan over a handful of prefixes

use crate::config::RoutingConfig;

/// Matches a path prefix on a segment boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || self.prefix.ends_with('/') || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Paths that bypass the classification middleware.
#[derive(Debug, Clone, Default)]
pub struct BypassMatcher {
    matchers: Vec<PathPrefixMatcher>,
}

impl BypassMatcher {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matchers: prefixes.into_iter().map(PathPrefixMatcher::new).collect(),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.bypass_prefixes.iter().cloned())
    }

    /// True if any prefix matches.
    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}
