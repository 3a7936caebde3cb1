//! In-memory transport for driving sessions without sockets.
//!
//! [`MemoryPeer`] plays the remote side: it pushes inbound messages,
//! injects read failures, makes writes fail, and observes everything the
//! session writes (frames, per-message closes, the final close).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::handler::MessageId;
use crate::net::transport::{FrameReader, FrameWriter, Transport};
use crate::protocol::Frame;

/// What the remote side observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Frame(Frame),
    ResponseClosed(MessageId),
    Closed,
}

/// Create a connected transport / peer pair.
pub fn pair() -> (MemoryTransport, MemoryPeer) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let fail_writes = Arc::new(AtomicBool::new(false));
    (
        MemoryTransport {
            inbound: in_rx,
            outbound: out_tx,
            fail_writes: fail_writes.clone(),
        },
        MemoryPeer {
            inbound: Some(in_tx),
            outbound: out_rx,
            fail_writes,
        },
    )
}

/// Session side of the in-memory connection.
#[derive(Debug)]
pub struct MemoryTransport {
    inbound: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
    outbound: mpsc::UnboundedSender<PeerEvent>,
    fail_writes: Arc<AtomicBool>,
}

impl Transport for MemoryTransport {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn split(self) -> (MemoryReader, MemoryWriter) {
        (
            MemoryReader {
                inbound: self.inbound,
            },
            MemoryWriter {
                outbound: self.outbound,
                fail_writes: self.fail_writes,
            },
        )
    }
}

#[derive(Debug)]
pub struct MemoryReader {
    inbound: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
}

impl FrameReader for MemoryReader {
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        match self.inbound.recv().await {
            Some(message) => message,
            None => Err(TransportError::Closed),
        }
    }
}

#[derive(Debug)]
pub struct MemoryWriter {
    outbound: mpsc::UnboundedSender<PeerEvent>,
    fail_writes: Arc<AtomicBool>,
}

impl FrameWriter for MemoryWriter {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Write("injected write failure".into()));
        }
        self.outbound
            .send(PeerEvent::Frame(frame))
            .map_err(|_| TransportError::Write("peer dropped".into()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let _ = self.outbound.send(PeerEvent::Closed);
        Ok(())
    }

    fn response_closed(&mut self, message_id: MessageId) {
        let _ = self.outbound.send(PeerEvent::ResponseClosed(message_id));
    }
}

/// Remote side of the in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>>,
    outbound: mpsc::UnboundedReceiver<PeerEvent>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Deliver one message to the session. Returns false once disconnected.
    pub fn send(&self, message: impl Into<Vec<u8>>) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(Ok(message.into())).is_ok(),
            None => false,
        }
    }

    /// Make the session's next read fail.
    pub fn inject_read_error(&self, reason: &str) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Err(TransportError::Read(reason.to_string())));
        }
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Close the inbound direction; the session sees `TransportError::Closed`.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }

    /// Next event written by the session; `None` when the writer is gone.
    pub async fn recv(&mut self) -> Option<PeerEvent> {
        self.outbound.recv().await
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<PeerEvent> {
        tokio::time::timeout(timeout, self.outbound.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next frame, skipping bookkeeping events.
    pub async fn recv_frame(&mut self, timeout: Duration) -> Option<Frame> {
        loop {
            match self.recv_timeout(timeout).await? {
                PeerEvent::Frame(frame) => return Some(frame),
                PeerEvent::ResponseClosed(_) => continue,
                PeerEvent::Closed => return None,
            }
        }
    }
}
