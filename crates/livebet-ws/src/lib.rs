//! WebSocket client for the livebet real-time feed.
//!
//! Provides the reconnecting connection state machine (`SocketClient`), the
//! wire codec for `{"type", "payload"}` frames, the typed event router, the
//! bounded outbound queue, and the backoff policy. Transport is behind a
//! trait so tests drive the state machine with a scripted link.

pub mod backoff;
pub mod client;
pub mod error;
pub mod message;
pub mod queue;
pub mod router;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use client::{ConnectionState, SocketClient, SocketConfig, SocketStats};
pub use error::{WsError, WsResult};
pub use message::{
    encode_frame, BetEventPayload, EventKind, FeedEvent, MatchStatusPayload, OddsUpdatePayload,
    HEARTBEAT_CLOSE_CODE, NORMAL_CLOSE_CODE, PING_TOKEN, PONG_TOKEN,
};
pub use queue::{FlushOutcome, MessageQueue, QueuedMessage};
pub use router::{EventRouter, Subscription};
pub use transport::{LinkEvent, Transport, TransportLink, WsTransport};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
