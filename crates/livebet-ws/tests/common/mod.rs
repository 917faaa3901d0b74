//! Scripted transport for driving the connection state machine in tests.

use async_trait::async_trait;
use livebet_ws::{LinkEvent, Transport, TransportLink, WsError, WsResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

enum Script {
    Refuse,
    Accept(MockLink),
}

/// Transport whose `connect` outcomes are scripted ahead of time.
/// An exhausted script refuses the connection.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<VecDeque<Script>>,
    connects: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script one failed connection attempt.
    pub fn script_failure(&self) {
        self.scripts.lock().push_back(Script::Refuse);
    }

    /// Script one successful connection; the returned handle plays the peer.
    pub fn script_link(&self) -> PeerHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let close_code = Arc::new(Mutex::new(None));

        self.scripts.lock().push_back(Script::Accept(MockLink {
            events: event_rx,
            frames: frame_tx,
            close_code: close_code.clone(),
        }));

        PeerHandle {
            events: event_tx,
            frames: frame_rx,
            close_code,
        }
    }

    /// Number of connection attempts seen so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _url: &str) -> WsResult<Box<dyn TransportLink>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.scripts.lock().pop_front() {
            Some(Script::Accept(link)) => Ok(Box::new(link)),
            Some(Script::Refuse) | None => {
                Err(WsError::ConnectionFailed("scripted refusal".to_string()))
            }
        }
    }
}

struct MockLink {
    events: mpsc::UnboundedReceiver<LinkEvent>,
    frames: mpsc::UnboundedSender<String>,
    close_code: Arc<Mutex<Option<u16>>>,
}

#[async_trait]
impl TransportLink for MockLink {
    async fn send(&mut self, text: String) -> WsResult<()> {
        self.frames
            .send(text)
            .map_err(|_| WsError::SendFailed("peer gone".to_string()))
    }

    async fn recv(&mut self) -> Option<LinkEvent> {
        self.events.recv().await
    }

    async fn close(&mut self, code: u16) -> WsResult<()> {
        *self.close_code.lock() = Some(code);
        Ok(())
    }
}

/// The server side of one scripted link.
pub struct PeerHandle {
    events: mpsc::UnboundedSender<LinkEvent>,
    frames: mpsc::UnboundedReceiver<String>,
    close_code: Arc<Mutex<Option<u16>>>,
}

impl PeerHandle {
    /// Deliver a text frame to the client.
    pub fn send_text(&self, text: &str) {
        let _ = self.events.send(LinkEvent::Text(text.to_string()));
    }

    /// Deliver a close event to the client.
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.events.send(LinkEvent::Closed {
            code,
            reason: reason.to_string(),
        });
    }

    /// Next frame the client transmitted, if any.
    pub fn try_recv_frame(&mut self) -> Option<String> {
        self.frames.try_recv().ok()
    }

    /// Close code the client closed this link with, if it did.
    pub fn close_code(&self) -> Option<u16> {
        *self.close_code.lock()
    }
}
