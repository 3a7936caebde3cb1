//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (target, raw_target)
//!     → router.rs (exact lookup on target)
//!     → matcher.rs (prefix scan on raw_target)
//!     → Return: matched route or no-match (404 reply)
//!
//! Route Registration (at startup):
//!     register_exact / register_prefix
//!     → RouteTable
//!     → Frozen inside the Dispatcher
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable while serving
//! - No regex in hot path (prefix matching only)
//! - Deterministic: longest matching prefix wins

pub mod matcher;
pub mod router;

pub use matcher::{MatchMode, PrefixMatcher};
pub use router::{RouteMatch, RouteTable};
