//! Message protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound WebSocket message (text or binary)
//!     → request.rs (split into target line + body line)
//!     → Request { target, raw_target, body, headers }
//!
//! Outbound reply
//!     → frame.rs (Frame::Text / Frame::Binary)
//!     → Reply { Status, Info } for JSON-shaped answers
//! ```
//!
//! # Wire Format
//! ```text
//! <raw_target>\n        e.g. /api/users?limit=10
//! <body>\n              opaque bytes, may be empty
//! ```
//! Lines after the body are ignored.

pub mod frame;
pub mod request;

pub use frame::{Frame, Reply, NOT_FOUND_PAYLOAD};
pub use request::Request;
