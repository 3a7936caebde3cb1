//! Route lookup.
//!
//! # Responsibilities
//! - Store exact and prefix registrations
//! - Resolve a request target to a handler
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Populated during setup, then frozen inside the dispatcher
//! - O(1) exact lookup via HashMap
//! - O(n) prefix scan, longest prefix first
//! - Re-registering a key replaces the previous handler

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;
use crate::routing::matcher::{MatchMode, PrefixMatcher};

/// A resolved route.
pub struct RouteMatch<'a> {
    /// Registration key that matched.
    pub pattern: &'a str,
    pub mode: MatchMode,
    handler: &'a Arc<dyn Handler>,
}

impl<'a> RouteMatch<'a> {
    pub fn handler(&self) -> &'a Arc<dyn Handler> {
        self.handler
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

struct PrefixRoute {
    matcher: PrefixMatcher,
    handler: Arc<dyn Handler>,
}

/// Exact and prefix handler registrations.
#[derive(Default)]
pub struct RouteTable {
    exact: HashMap<String, Arc<dyn Handler>>,
    /// Sorted by prefix length, longest first.
    prefixes: Vec<PrefixRoute>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `key`.
    pub fn register<H: Handler>(&mut self, key: impl Into<String>, mode: MatchMode, handler: H) {
        self.register_arc(key, mode, Arc::new(handler));
    }

    pub fn register_arc(&mut self, key: impl Into<String>, mode: MatchMode, handler: Arc<dyn Handler>) {
        let key = key.into();
        match mode {
            MatchMode::Exact => {
                if self.exact.insert(key.clone(), handler).is_some() {
                    tracing::warn!(key = %key, "Exact route re-registered, previous handler replaced");
                }
            }
            MatchMode::Prefix => {
                if let Some(existing) = self.prefixes.iter_mut().find(|r| r.matcher.prefix() == key) {
                    tracing::warn!(key = %key, "Prefix route re-registered, previous handler replaced");
                    existing.handler = handler;
                    return;
                }
                self.prefixes.push(PrefixRoute {
                    matcher: PrefixMatcher::new(key),
                    handler,
                });
                // Stable: equal lengths keep registration order.
                self.prefixes.sort_by(|a, b| b.matcher.len().cmp(&a.matcher.len()));
            }
        }
    }

    /// Resolve a request. Exact on `target` first, then prefixes on `raw_target`.
    pub fn resolve<'a>(&'a self, target: &str, raw_target: &str) -> Option<RouteMatch<'a>> {
        if let Some((key, handler)) = self.exact.get_key_value(target) {
            return Some(RouteMatch {
                pattern: key,
                mode: MatchMode::Exact,
                handler,
            });
        }

        self.prefixes
            .iter()
            .find(|route| route.matcher.matches(raw_target))
            .map(|route| RouteMatch {
                pattern: route.matcher.prefix(),
                mode: MatchMode::Prefix,
                handler: &route.handler,
            })
    }

    /// Number of registrations across both modes.
    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<&str> = self.exact.keys().map(String::as_str).collect();
        exact.sort_unstable();
        let prefixes: Vec<&str> = self.prefixes.iter().map(|r| r.matcher.prefix()).collect();
        f.debug_struct("RouteTable")
            .field("exact", &exact)
            .field("prefixes", &prefixes)
            .finish()
    }
}
