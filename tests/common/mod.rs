//! Shared utilities for end-to-end and load testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use wsmux::{Dispatcher, Frame, MuxConfig, MuxServer, ServerHandle};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Start a server with default config on an ephemeral port.
pub async fn start_server(dispatcher: Dispatcher) -> ServerHandle {
    start_server_with(MuxConfig::default(), dispatcher).await
}

pub async fn start_server_with(config: MuxConfig, dispatcher: Dispatcher) -> ServerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    MuxServer::new(config, dispatcher).start(listener).unwrap()
}

pub fn ws_url(addr: SocketAddr, path: &str) -> String {
    format!("ws://{}{}", addr, path)
}

pub async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(ws_url(addr, "/")).await.unwrap();
    ws
}

/// Send one `target\nbody\n` message as a text frame.
pub async fn send(ws: &mut Client, target: &str, body: &str) {
    ws.send(Message::text(format!("{}\n{}\n", target, body)))
        .await
        .unwrap();
}

pub async fn send_raw(ws: &mut Client, data: &[u8]) {
    ws.send(Message::binary(data.to_vec())).await.unwrap();
}

/// Next data frame, or `None` on timeout or close.
pub async fn recv_frame(ws: &mut Client, timeout: Duration) -> Option<Frame> {
    loop {
        let message = tokio::time::timeout(timeout, ws.next()).await.ok()??.ok()?;
        match message {
            Message::Text(text) => return Some(Frame::text(text.as_str())),
            Message::Binary(data) => return Some(Frame::binary(data.to_vec())),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Text of the next frame; panics on timeout.
pub async fn recv_text(ws: &mut Client) -> String {
    let frame = recv_frame(ws, RECV_TIMEOUT).await.expect("expected a frame");
    String::from_utf8(frame.as_bytes().to_vec()).unwrap()
}
