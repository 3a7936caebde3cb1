//! Per-message dispatch.
//!
//! # Steps (strictly sequential within one message)
//! ```text
//! raw bytes
//!     → Request::parse            (malformed: drop silently, sink not closed)
//!     → Pipeline::run_all         (every pre-handler, in order)
//!     → RouteTable::resolve       (exact on target, then longest prefix on raw_target)
//!     → handler / 404 reply
//!     → sink.close()              (always, even after a handler panic)
//! ```
//!
//! # Design Decisions
//! - The dispatcher is immutable; it is built once and shared via Arc
//! - Handler panics are caught here so the session loop never sees them
//! - Handler errors are logged, not answered

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;

use crate::dispatch::pipeline::Pipeline;
use crate::handler::{Handler, HandlerResult, ResponseSink};
use crate::observability::metrics;
use crate::protocol::{Frame, Request};
use crate::routing::{MatchMode, RouteTable};

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A handler ran and returned Ok.
    Handled,
    /// A handler ran and returned an error.
    HandlerError,
    /// A handler panicked.
    Faulted,
    /// No route matched; the 404 reply was written.
    NotFound,
    /// The message was not a two-line frame; nothing was written.
    Malformed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Handled => "handled",
            Outcome::HandlerError => "handler_error",
            Outcome::Faulted => "faulted",
            Outcome::NotFound => "not_found",
            Outcome::Malformed => "malformed",
        }
    }

    /// Whether the sink was closed for this message.
    pub fn closed_sink(&self) -> bool {
        !matches!(self, Outcome::Malformed)
    }
}

/// Setup-time registration of routes and pre-handlers.
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    routes: RouteTable,
    pipeline: Pipeline,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route requests whose target equals `target`.
    pub fn register_exact<F, Fut>(self, target: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ResponseSink, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(target, MatchMode::Exact, handler)
    }

    /// Route requests whose raw target (query included) starts with `prefix`.
    pub fn register_prefix<F, Fut>(self, prefix: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ResponseSink, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(prefix, MatchMode::Prefix, handler)
    }

    pub fn register<H: Handler>(mut self, key: impl Into<String>, mode: MatchMode, handler: H) -> Self {
        self.routes.register(key, mode, handler);
        self
    }

    /// Append a pre-handler; they run in the order added.
    pub fn add_pre_handler<F>(mut self, pre_handler: F) -> Self
    where
        F: Fn(&ResponseSink, &mut Request) + Send + Sync + 'static,
    {
        self.pipeline.append(pre_handler);
        self
    }

    pub fn build(self) -> Dispatcher {
        tracing::debug!(
            routes = self.routes.len(),
            pre_handlers = self.pipeline.len(),
            "Dispatcher built"
        );
        Dispatcher {
            routes: self.routes,
            pipeline: self.pipeline,
        }
    }
}

/// Frozen routes and pre-handlers.
#[derive(Debug)]
pub struct Dispatcher {
    routes: RouteTable,
    pipeline: Pipeline,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Dispatch one raw message, writing replies to `sink`.
    pub async fn handle(&self, sink: ResponseSink, raw: Vec<u8>) -> Outcome {
        let start = Instant::now();
        let message_id = sink.message_id();

        let request = match Request::parse(&raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(message_id = %message_id, error = %e, "Dropping malformed frame");
                metrics::record_dispatch(Outcome::Malformed.as_str(), start);
                return Outcome::Malformed;
            }
        };

        let outcome = match AssertUnwindSafe(self.route(&sink, request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                tracing::error!(
                    message_id = %message_id,
                    panic = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                Outcome::Faulted
            }
        };

        sink.close();
        metrics::record_dispatch(outcome.as_str(), start);
        outcome
    }

    async fn route(&self, sink: &ResponseSink, mut request: Request) -> Outcome {
        self.pipeline.run_all(sink, &mut request);

        let Some(route) = self.routes.resolve(request.target(), request.raw_target()) else {
            tracing::debug!(
                message_id = %sink.message_id(),
                request_target = %request.raw_target(),
                "No route matched"
            );
            if let Err(e) = sink.write(Frame::not_found()) {
                tracing::debug!(message_id = %sink.message_id(), error = %e, "Failed to queue 404 reply");
            }
            return Outcome::NotFound;
        };

        let pattern = route.pattern;
        tracing::trace!(
            message_id = %sink.message_id(),
            pattern = %pattern,
            mode = %route.mode,
            "Route matched"
        );

        match route.handler().call(sink.clone(), request).await {
            Ok(()) => Outcome::Handled,
            Err(e) => {
                tracing::warn!(
                    message_id = %sink.message_id(),
                    pattern = %pattern,
                    error = %e,
                    "Handler returned error"
                );
                Outcome::HandlerError
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MuxError;
    use crate::handler::{MessageId, Outbound};
    use crate::protocol::NOT_FOUND_PAYLOAD;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    fn test_sink(id: u64) -> (ResponseSink, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ResponseSink::new(MessageId::new(id), tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item);
        }
        out
    }

    fn tagging(tag: &'static str) -> impl Fn(ResponseSink, Request) -> futures_util::future::Ready<HandlerResult> {
        move |sink, _req| futures_util::future::ready(sink.write_text(tag).map_err(MuxError::from))
    }

    #[tokio::test]
    async fn exact_route_then_close() {
        let dispatcher = Dispatcher::builder()
            .register_exact("/a", tagging("exact"))
            .register_prefix("/", tagging("prefix"))
            .build();

        let (sink, mut rx) = test_sink(1);
        assert_eq!(dispatcher.handle(sink, b"/a\nbody".to_vec()).await, Outcome::Handled);
        assert_eq!(
            drain(&mut rx),
            vec![
                Outbound::Frame(Frame::text("exact")),
                Outbound::Closed(MessageId::new(1)),
            ]
        );
    }

    #[tokio::test]
    async fn prefix_route_sees_query() {
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let dispatcher = Dispatcher::builder()
            .register_prefix("/api/", move |_sink, req: Request| {
                *s.lock().unwrap() = Some(req.raw_target().to_string());
                async { Ok(()) }
            })
            .build();

        let (sink, _rx) = test_sink(1);
        assert_eq!(
            dispatcher.handle(sink, b"/api/users?x=1\n\n".to_vec()).await,
            Outcome::Handled
        );
        assert_eq!(seen.lock().unwrap().as_deref(), Some("/api/users?x=1"));
    }

    #[tokio::test]
    async fn unmatched_writes_404_then_closes() {
        let dispatcher = Dispatcher::builder()
            .register_exact("/a", tagging("a"))
            .build();

        let (sink, mut rx) = test_sink(3);
        assert_eq!(dispatcher.handle(sink, b"/missing\n".to_vec()).await, Outcome::Malformed);
        assert!(drain(&mut rx).is_empty());

        let (sink, mut rx) = test_sink(4);
        assert_eq!(dispatcher.handle(sink, b"/missing\n\n".to_vec()).await, Outcome::NotFound);
        assert_eq!(
            drain(&mut rx),
            vec![
                Outbound::Frame(Frame::Text(NOT_FOUND_PAYLOAD.to_string())),
                Outbound::Closed(MessageId::new(4)),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_writes_nothing_and_skips_pipeline() {
        let ran = Arc::new(Mutex::new(0));
        let r = ran.clone();
        let dispatcher = Dispatcher::builder()
            .add_pre_handler(move |_, _| *r.lock().unwrap() += 1)
            .build();

        for raw in [&b""[..], b"/only-one-line", b"/only-one-line\n"] {
            let (sink, mut rx) = test_sink(1);
            assert_eq!(dispatcher.handle(sink, raw.to_vec()).await, Outcome::Malformed);
            assert!(drain(&mut rx).is_empty());
        }
        assert_eq!(*ran.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn pre_handlers_run_in_order_even_for_404() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        let dispatcher = Dispatcher::builder()
            .add_pre_handler(move |_, req| {
                o1.lock().unwrap().push(format!("first {}", req.target()));
                req.headers_mut().insert("x-user".into(), "ada".into());
            })
            .add_pre_handler(move |_, req| {
                o2.lock().unwrap().push(format!("second {}", req.header("x-user").unwrap_or("-")));
            })
            .build();

        let (sink, mut rx) = test_sink(1);
        assert_eq!(dispatcher.handle(sink, b"/nowhere\n\n".to_vec()).await, Outcome::NotFound);
        assert_eq!(*order.lock().unwrap(), vec!["first /nowhere", "second ada"]);
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test]
    async fn pre_handler_reply_does_not_stop_routing() {
        let dispatcher = Dispatcher::builder()
            .add_pre_handler(|sink, _| {
                let _ = sink.write_text("denied");
            })
            .register_exact("/a", tagging("handler"))
            .build();

        let (sink, mut rx) = test_sink(9);
        assert_eq!(dispatcher.handle(sink, b"/a\n\n".to_vec()).await, Outcome::Handled);
        assert_eq!(
            drain(&mut rx),
            vec![
                Outbound::Frame(Frame::text("denied")),
                Outbound::Frame(Frame::text("handler")),
                Outbound::Closed(MessageId::new(9)),
            ]
        );
    }

    #[tokio::test]
    async fn handler_panic_still_closes_sink() {
        let dispatcher = Dispatcher::builder()
            .register_exact("/boom", |sink: ResponseSink, _req| async move {
                sink.write_text("partial")?;
                panic!("handler exploded");
            })
            .build();

        let (sink, mut rx) = test_sink(5);
        assert_eq!(dispatcher.handle(sink, b"/boom\n\n".to_vec()).await, Outcome::Faulted);
        assert_eq!(
            drain(&mut rx),
            vec![
                Outbound::Frame(Frame::text("partial")),
                Outbound::Closed(MessageId::new(5)),
            ]
        );
    }

    #[tokio::test]
    async fn handler_error_is_reported_and_closed() {
        let dispatcher = Dispatcher::builder()
            .register_exact("/json", |_sink, req: Request| async move {
                let _value: serde_json::Value = req.decode_body()?;
                Ok(())
            })
            .build();

        let (sink, mut rx) = test_sink(6);
        assert_eq!(
            dispatcher.handle(sink, b"/json\nnot json".to_vec()).await,
            Outcome::HandlerError
        );
        assert_eq!(drain(&mut rx), vec![Outbound::Closed(MessageId::new(6))]);
    }

    #[tokio::test]
    async fn sink_is_closed_once_per_parsed_message() {
        let dispatcher = Dispatcher::builder()
            .register_exact("/a", tagging("a"))
            .build();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let messages: [&[u8]; 5] = [b"/a\n\n", b"bad", b"/b\n\n", b"", b"/a?q\nx"];
        let mut parsed = 0;
        for (i, raw) in messages.iter().enumerate() {
            let sink = ResponseSink::new(MessageId::new(i as u64), tx.clone());
            if dispatcher.handle(sink, raw.to_vec()).await.closed_sink() {
                parsed += 1;
            }
        }

        let closes = drain(&mut rx)
            .into_iter()
            .filter(|o| matches!(o, Outbound::Closed(_)))
            .count();
        assert_eq!(parsed, 3);
        assert_eq!(closes, parsed);
    }
}
