//! Connection session: the per-connection receive loop.
//!
//! # Responsibilities
//! - Read messages one at a time from the transport
//! - Spawn one dispatch task per message without waiting for it
//! - Own the write half through a single writer task
//! - End on read failure, peer close, or server shutdown
//!
//! # Lifecycle
//! ```text
//! serve(transport)
//!     → split → writer task (drains every sink of this session)
//!     → loop { receive → spawn dispatch }
//!     → read error / close / shutdown: stop reading
//!     → writer closes the transport once the last sink is dropped
//! ```
//!
//! # Design Decisions
//! - A slow handler never blocks the next read unless `max_in_flight` is set
//! - Handler faults stay inside their dispatch task
//! - A failed write stops the writer; later sink writes report `Disconnected`

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};

use crate::dispatch::Dispatcher;
use crate::error::TransportError;
use crate::handler::{MessageId, Outbound, ResponseSink};
use crate::lifecycle::shutdown;
use crate::net::connection::{ActivityTracker, SessionId};
use crate::net::transport::{FrameReader, FrameWriter, Transport};
use crate::observability::metrics;

/// Per-session concurrency policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Maximum dispatch tasks in flight; `None` is unbounded.
    ///
    /// When the limit is reached the receive loop waits for a slot before
    /// reading further.
    pub max_in_flight: Option<usize>,
}

/// Why a session stopped reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    PeerClosed,
    ReadFailed(TransportError),
    Shutdown,
}

/// One accepted connection.
pub struct Session {
    id: SessionId,
    dispatcher: Arc<Dispatcher>,
    policy: SessionPolicy,
    dispatches: ActivityTracker,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Session {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            id: SessionId::new(),
            dispatcher,
            policy: SessionPolicy::default(),
            dispatches: ActivityTracker::new(),
            shutdown: None,
        }
    }

    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Count this session's dispatch tasks in a shared tracker.
    pub fn with_tracker(mut self, dispatches: ActivityTracker) -> Self {
        self.dispatches = dispatches;
        self
    }

    /// Stop reading when the shutdown signal fires.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Run the receive loop until the transport fails or closes.
    pub async fn serve<T: Transport>(mut self, transport: T) -> SessionEnd {
        let _gauge = metrics::SessionGauge::open();
        let (mut reader, writer) = transport.split();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(writer, rx, self.id));

        let in_flight = self
            .policy
            .max_in_flight
            .map(|limit| Arc::new(Semaphore::new(limit)));
        let mut next_message: u64 = 0;

        tracing::info!(session_id = %self.id, max_in_flight = ?self.policy.max_in_flight, "Session started");

        let end = loop {
            let data = tokio::select! {
                res = reader.receive() => match res {
                    Ok(data) => data,
                    Err(TransportError::Closed) => break SessionEnd::PeerClosed,
                    Err(e) => break SessionEnd::ReadFailed(e),
                },
                _ = shutdown_requested(&mut self.shutdown) => break SessionEnd::Shutdown,
            };

            next_message += 1;
            let permit = match &in_flight {
                Some(limit) => tokio::select! {
                    permit = limit.clone().acquire_owned() => permit.ok(),
                    _ = shutdown_requested(&mut self.shutdown) => break SessionEnd::Shutdown,
                },
                None => None,
            };

            let sink = ResponseSink::new(MessageId::new(next_message), tx.clone());
            let guard = self.dispatches.track();
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                let _permit = permit;
                let _guard = guard;
                dispatcher.handle(sink, data).await;
            });
        };

        match &end {
            SessionEnd::ReadFailed(e) => {
                tracing::warn!(session_id = %self.id, messages = next_message, error = %e, "Session ended on read failure")
            }
            _ => tracing::info!(session_id = %self.id, messages = next_message, reason = ?end, "Session ended"),
        }
        end
    }
}

async fn shutdown_requested(signal: &mut Option<watch::Receiver<bool>>) {
    match signal {
        Some(rx) => shutdown::signalled(rx).await,
        None => std::future::pending::<()>().await,
    }
}

async fn write_loop<W: FrameWriter>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    session_id: SessionId,
) {
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Frame(frame) => {
                if let Err(e) = writer.send(frame).await {
                    tracing::warn!(session_id = %session_id, error = %e, "Write failed, stopping session writer");
                    metrics::record_write_error();
                    break;
                }
            }
            Outbound::Closed(message_id) => writer.response_closed(message_id),
        }
    }
    drop(rx);

    if let Err(e) = writer.close().await {
        tracing::debug!(session_id = %session_id, error = %e, "Transport close failed");
    }
    tracing::debug!(session_id = %session_id, "Session writer finished");
}
