//! Message transport abstraction.
//!
//! A session only needs three operations from the connection: receive one
//! message, send one frame, close. The transport is split into a read half
//! (driven by the receive loop) and a write half (owned by the session
//! writer task) so replies can go out while the next message is read.

use std::future::Future;

use crate::error::TransportError;
use crate::handler::MessageId;
use crate::protocol::Frame;

/// Read half of a connection.
pub trait FrameReader: Send + 'static {
    /// Wait for the next message payload.
    ///
    /// Returns `TransportError::Closed` when the peer is gone. Control
    /// frames (ping/pong) are consumed internally and never returned.
    fn receive(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Write half of a connection.
pub trait FrameWriter: Send + 'static {
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// The dispatch engine finished the response for `message_id`.
    ///
    /// Nothing goes on the wire for this; transports may use it for
    /// bookkeeping.
    fn response_closed(&mut self, message_id: MessageId) {
        let _ = message_id;
    }
}

/// A bidirectional message connection.
pub trait Transport: Send + 'static {
    type Reader: FrameReader;
    type Writer: FrameWriter;

    fn split(self) -> (Self::Reader, Self::Writer);
}
