//! Error types shared across the multiplexer.

use thiserror::Error;

/// Failure to decode a raw message into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The message does not contain both a target line and a body line.
    #[error("malformed frame: missing {0} line")]
    Malformed(&'static str),
}

/// Failure reported by the underlying message transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer closed the connection (or the stream ended).
    #[error("transport closed")]
    Closed,

    /// Reading the next message failed.
    #[error("transport read failed: {0}")]
    Read(String),

    /// Writing a frame failed.
    #[error("transport write failed: {0}")]
    Write(String),
}

/// Failure to write through a per-message response sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink was already closed by the dispatch engine.
    #[error("response sink closed")]
    Closed,

    /// The session writer is gone (transport write failed or session ended).
    #[error("session writer disconnected")]
    Disconnected,

    /// A structured reply could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to decode a request body on demand.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body line was present but empty.
    #[error("body is empty")]
    Empty,

    /// The body is not valid JSON for the requested type.
    #[error("body decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Body(#[from] BodyError),

    /// Handler-specific failure, logged by the dispatch engine.
    #[error("handler error: {0}")]
    Handler(String),

    /// The server did not stop within the requested window.
    #[error("shutdown timed out")]
    ShutdownTimeout,

    /// The server task ended abnormally.
    #[error("server task failed: {0}")]
    ServerTask(String),
}

/// Result type alias using MuxError.
pub type Result<T> = std::result::Result<T, MuxError>;
