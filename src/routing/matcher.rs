//! Route matching logic.
//!
//! # Responsibilities
//! - Exact match: registered key equals the routing target
//! - Prefix match: registered key is a byte prefix of the raw target
//!
//! # Design Decisions
//! - Prefix matching sees the query suffix (`/api?v=1` matches prefix `/api?`)
//! - Matching is case-sensitive and byte-wise
//! - No regex to guarantee O(n) matching

use std::fmt;

/// How a registration key is compared against incoming targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Key must equal the target (query stripped).
    Exact,
    /// Key must be a prefix of the raw target (query included).
    Prefix,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Prefix => write!(f, "prefix"),
        }
    }
}

/// Matches the raw target against a literal prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    pub fn matches(&self, raw_target: &str) -> bool {
        raw_target.as_bytes().starts_with(self.prefix.as_bytes())
    }
}
