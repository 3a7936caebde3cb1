//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop session reads
//!     → Drain in-flight dispatches (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, stop reads, drain, close
//! - Every phase has a deadline: the listener grace window and the drain timeout

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
