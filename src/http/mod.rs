//! HTTP and WebSocket subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, session limit, upgrade)
//!     → websocket.rs (split socket into FrameReader / FrameWriter)
//!     → net::session (receive loop, one dispatch per message)
//! ```

pub mod server;
pub mod websocket;

pub use server::{MuxServer, ServerHandle};
