//! Handler capabilities.
//!
//! Two roles share the same `(sink, request)` shape:
//! - [`Handler`]: the routed endpoint; owns the request and may await.
//! - [`PreHandler`]: runs before routing; borrows the request mutably to
//!   annotate headers and may write to the sink. It cannot stop dispatch.
//!
//! Closures implement both traits, so registration usually looks like:
//!
//! ```ignore
//! builder.register_exact("/ping", |sink: ResponseSink, _req: Request| async move {
//!     sink.write_text("pong")?;
//!     Ok(())
//! });
//! ```

pub mod sink;

use std::future::Future;
use std::pin::Pin;

use crate::error::MuxError;
use crate::protocol::Request;

pub use sink::{MessageId, Outbound, ResponseSink};

/// Result returned by routed handlers. Errors are logged, never acted on.
pub type HandlerResult = Result<(), MuxError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A routed endpoint.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, sink: ResponseSink, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(ResponseSink, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, sink: ResponseSink, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(sink, request))
    }
}

/// A cross-cutting step run for every parsed request before routing.
pub trait PreHandler: Send + Sync + 'static {
    fn call(&self, sink: &ResponseSink, request: &mut Request);
}

impl<F> PreHandler for F
where
    F: Fn(&ResponseSink, &mut Request) + Send + Sync + 'static,
{
    fn call(&self, sink: &ResponseSink, request: &mut Request) {
        (self)(sink, request)
    }
}
