//! Scripted transport and gateway for end-to-end application tests.

use async_trait::async_trait;
use livebet_client::{AppResult, BetGateway, PlacedBet};
use livebet_core::BetTicket;
use livebet_ws::{LinkEvent, Transport, TransportLink, WsError, WsResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Transport that hands out pre-scripted links.
#[derive(Default)]
pub struct MockTransport {
    links: Mutex<VecDeque<MockLink>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script one successful connection; the returned handle plays the peer.
    pub fn script_link(&self) -> PeerHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();

        self.links.lock().push_back(MockLink {
            events: event_rx,
            frames: frame_tx,
        });

        PeerHandle {
            events: event_tx,
            frames: frame_rx,
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _url: &str) -> WsResult<Box<dyn TransportLink>> {
        match self.links.lock().pop_front() {
            Some(link) => Ok(Box::new(link)),
            None => Err(WsError::ConnectionFailed("scripted refusal".to_string())),
        }
    }
}

struct MockLink {
    events: mpsc::UnboundedReceiver<LinkEvent>,
    frames: mpsc::UnboundedSender<String>,
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

    async fn close(&mut self, _code: u16) -> WsResult<()> {
        Ok(())
    }
}

/// The server side of one scripted link.
pub struct PeerHandle {
    events: mpsc::UnboundedSender<LinkEvent>,
    #[allow(dead_code)]
    frames: mpsc::UnboundedReceiver<String>,
}

impl PeerHandle {
    pub fn send_text(&self, text: &str) {
        let _ = self.events.send(LinkEvent::Text(text.to_string()));
    }
}

/// Gateway that acknowledges every bet as pending with a fixed id.
pub struct PendingGateway {
    bet_id: String,
}

impl PendingGateway {
    pub fn new(bet_id: &str) -> Arc<Self> {
        Arc::new(Self {
            bet_id: bet_id.to_string(),
        })
    }
}

#[async_trait]
impl BetGateway for PendingGateway {
    async fn place_bet(&self, _ticket: &BetTicket) -> AppResult<PlacedBet> {
        Ok(PlacedBet {
            bet_id: self.bet_id.as_str().into(),
            status: livebet_core::BetStatus::Pending,
        })
    }
}
