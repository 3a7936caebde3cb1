//! WebSocket request multiplexer.
//!
//! Each WebSocket message carries one request: a target line and a body
//! line. Messages are parsed, run through pre-handlers, routed by exact or
//! prefix match, and answered on the same connection. Every message is
//! dispatched as its own task, so replies may arrive out of order.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod routing;

pub use config::MuxConfig;
pub use dispatch::{Dispatcher, DispatcherBuilder, Outcome};
pub use error::{MuxError, Result};
pub use handler::{HandlerResult, ResponseSink};
pub use http::{MuxServer, ServerHandle};
pub use lifecycle::Shutdown;
pub use net::session::Session;
pub use protocol::{Frame, Reply, Request};
