//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Upgraded connection (any `Transport`)
//!     → session.rs (receive loop, writer task)
//!     → connection.rs (session IDs, activity tracking, session limit)
//!     → Hand each message to the dispatch engine
//!
//! Session States:
//!     Reading → (read error | peer close | shutdown) → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so sessions run over WebSockets or in memory
//! - Each session and each dispatch is tracked for graceful shutdown

pub mod connection;
pub mod memory;
pub mod session;
pub mod transport;

pub use connection::{ActivityTracker, SessionId, SessionLimiter};
pub use session::{Session, SessionEnd, SessionPolicy};
pub use transport::{FrameReader, FrameWriter, Transport};
