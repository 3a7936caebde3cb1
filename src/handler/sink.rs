//! Per-message response channel.
//!
//! # Responsibilities
//! - Queue reply frames for the session writer
//! - Refuse writes once the dispatch engine has closed it
//! - Report a gone writer back to the caller
//!
//! # Design Decisions
//! - Writes are synchronous queue pushes; the session writer owns the socket
//! - Clones share the closed flag, so a handler cannot outlive its close
//! - Closing is logical: the connection itself stays open

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::SinkError;
use crate::protocol::Frame;

/// Identifier of one inbound message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Item consumed by the session writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A frame to put on the wire.
    Frame(Frame),
    /// The response for this message is complete.
    Closed(MessageId),
}

/// Write handle for the replies to a single message.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    message_id: MessageId,
    tx: mpsc::UnboundedSender<Outbound>,
    closed: Arc<AtomicBool>,
}

impl ResponseSink {
    /// Create a sink feeding the given writer queue.
    pub fn new(message_id: MessageId, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            message_id,
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Queue one frame.
    ///
    /// `Ok` means the frame was queued, not delivered. A transport write
    /// failure stops the session writer; it surfaces on the next write
    /// after that as [`SinkError::Disconnected`].
    pub fn write(&self, frame: Frame) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        self.tx
            .send(Outbound::Frame(frame))
            .map_err(|_| SinkError::Disconnected)
    }

    pub fn write_text(&self, text: impl Into<String>) -> Result<(), SinkError> {
        self.write(Frame::text(text))
    }

    pub fn write_binary(&self, data: impl Into<Vec<u8>>) -> Result<(), SinkError> {
        self.write(Frame::binary(data))
    }

    /// Serialize `value` as JSON and queue it as a text frame.
    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), SinkError> {
        let text = serde_json::to_string(value)?;
        self.write(Frame::Text(text))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the sink. Returns false if it was already closed.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.tx.send(Outbound::Closed(self.message_id));
        true
    }
}
