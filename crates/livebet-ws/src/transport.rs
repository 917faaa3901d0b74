//! Transport seam between the connection state machine and the socket.
//!
//! The client drives a `TransportLink` it obtained from a `Transport`; the
//! production implementation wraps tokio-tungstenite, tests substitute a
//! scripted one. Protocol-level ping/pong frames are answered here so the
//! state machine only ever sees text and close events.

use crate::error::{WsError, WsResult};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

/// What the link reports back to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A text frame arrived (heartbeat token or JSON event frame).
    Text(String),
    /// The peer closed the link, or it failed mid-read.
    Closed { code: u16, reason: String },
}

/// Factory for connections. One `connect` call yields one link.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, url: &str) -> WsResult<Box<dyn TransportLink>>;
}

/// One open connection.
#[async_trait]
pub trait TransportLink: Send {
    async fn send(&mut self, text: String) -> WsResult<()>;

    /// Next event from the peer. `None` means the stream ended without a
    /// close frame.
    async fn recv(&mut self) -> Option<LinkEvent>;

    async fn close(&mut self, code: u16) -> WsResult<()>;
}

/// Production transport over tokio-tungstenite.
#[derive(Debug, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> WsResult<Box<dyn TransportLink>> {
        debug!(%url, "Opening WebSocket");
        // TCP_NODELAY for lower latency (disable Nagle's algorithm)
        let (stream, _response) = connect_async_tls_with_config(url, None, true, None)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        Ok(Box::new(WsLink { stream }))
    }
}

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl TransportLink for WsLink {
    async fn send(&mut self, text: String) -> WsResult<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Option<LinkEvent> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(LinkEvent::Text(text)),
                Ok(Message::Ping(data)) => {
                    // Protocol-level keepalive, answered transparently
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        warn!(?e, "Failed to answer protocol ping");
                        return Some(LinkEvent::Closed {
                            code: 1006,
                            reason: e.to_string(),
                        });
                    }
                }
                Ok(Message::Pong(_)) | Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, String::new()));
                    return Some(LinkEvent::Closed { code, reason });
                }
                Err(e) => {
                    return Some(LinkEvent::Closed {
                        code: 1006,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn close(&mut self, code: u16) -> WsResult<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        };
        self.stream
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }
}
