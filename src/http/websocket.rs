//! WebSocket transport.
//!
//! # Responsibilities
//! - Split an upgraded axum WebSocket into read and write halves
//! - Surface text and binary messages as raw payload bytes
//! - Map close frames and stream end to `TransportError::Closed`
//!
//! # Design Decisions
//! - Ping/pong are answered by the WebSocket layer and skipped here
//! - Outbound `Frame::Text` goes out as a text message, `Frame::Binary` as binary

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::error::TransportError;
use crate::net::transport::{FrameReader, FrameWriter, Transport};
use crate::protocol::Frame;

impl Transport for WebSocket {
    type Reader = WsReader;
    type Writer = WsWriter;

    fn split(self) -> (WsReader, WsWriter) {
        let (sink, stream) = StreamExt::split(self);
        (WsReader { stream }, WsWriter { sink })
    }
}

/// Read half of an upgraded WebSocket.
pub struct WsReader {
    stream: SplitStream<WebSocket>,
}

impl FrameReader for WsReader {
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().as_bytes().to_vec()),
                Some(Ok(Message::Binary(data))) => return Ok(data.to_vec()),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
            }
        }
    }
}

/// Write half of an upgraded WebSocket.
pub struct WsWriter {
    sink: SplitSink<WebSocket, Message>,
}

impl FrameWriter for WsWriter {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data.into()),
        };
        self.sink
            .send(message)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}
