//! Wire codec for the livebet feed.
//!
//! Every data frame is JSON of the form `{"type": <kind>, "payload": {...}}`.
//! Heartbeat probes are bare text tokens (`ping`/`pong`), never JSON-wrapped,
//! and are consumed before the codec sees a frame.

use livebet_core::{BetId, BetStatus, MatchId, MatchStatus, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Heartbeat probe sent by the client.
pub const PING_TOKEN: &str = "ping";
/// Heartbeat response expected from the server.
pub const PONG_TOKEN: &str = "pong";

/// Close code used when the heartbeat monitor declares the link a zombie.
pub const HEARTBEAT_CLOSE_CODE: u16 = 4000;
/// Close code for an orderly client-initiated disconnect.
pub const NORMAL_CLOSE_CODE: u16 = 1000;

/// Event kind discriminant, used as the router's subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OddsUpdated,
    BetValidated,
    BetRejected,
    MatchStatusChanged,
}

impl EventKind {
    /// Wire spelling of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OddsUpdated => "odds:updated",
            Self::BetValidated => "bet:validated",
            Self::BetRejected => "bet:rejected",
            Self::MatchStatusChanged => "match:status_changed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an `odds:updated` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsUpdatePayload {
    pub match_id: MatchId,
    pub odds: Decimal,
    /// Server-side emission timestamp (epoch milliseconds).
    pub timestamp: i64,
}

/// Payload shared by `bet:validated` and `bet:rejected` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetEventPayload {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub match_id: MatchId,
    pub amount: Decimal,
    pub odds: Decimal,
    pub status: BetStatus,
}

/// Payload of a `match:status_changed` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStatusPayload {
    pub match_id: MatchId,
    pub status: MatchStatus,
}

/// Inbound event, decoded from one wire frame.
///
/// Immutable once constructed; dispatched by reference to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum FeedEvent {
    #[serde(rename = "odds:updated")]
    OddsUpdated(OddsUpdatePayload),
    #[serde(rename = "bet:validated")]
    BetValidated(BetEventPayload),
    #[serde(rename = "bet:rejected")]
    BetRejected(BetEventPayload),
    #[serde(rename = "match:status_changed")]
    MatchStatusChanged(MatchStatusPayload),
}

impl FeedEvent {
    /// Decode a wire frame. Heartbeat tokens must be filtered out first.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::OddsUpdated(_) => EventKind::OddsUpdated,
            Self::BetValidated(_) => EventKind::BetValidated,
            Self::BetRejected(_) => EventKind::BetRejected,
            Self::MatchStatusChanged(_) => EventKind::MatchStatusChanged,
        }
    }

    /// The bet this event resolves, if it is a resolution event.
    pub fn resolved_bet(&self) -> Option<(&BetId, BetStatus)> {
        match self {
            Self::BetValidated(p) => Some((&p.bet_id, BetStatus::Validated)),
            Self::BetRejected(p) => Some((&p.bet_id, BetStatus::Rejected)),
            _ => None,
        }
    }
}

/// Encode an outbound command as a `{"type", "payload"}` frame.
pub fn encode_frame<T: Serialize>(kind: &str, payload: &T) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Frame<'a, T> {
        #[serde(rename = "type")]
        kind: &'a str,
        payload: &'a T,
    }
    serde_json::to_string(&Frame { kind, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decode_odds_updated() {
        let raw = json!({
            "type": "odds:updated",
            "payload": {"match_id": "m1", "odds": 1.9, "timestamp": 1700000000000_i64}
        })
        .to_string();

        let event = FeedEvent::decode(&raw).unwrap();
        assert_eq!(event.kind(), EventKind::OddsUpdated);
        match event {
            FeedEvent::OddsUpdated(p) => {
                assert_eq!(p.match_id, MatchId::from("m1"));
                assert_eq!(p.odds, dec!(1.9));
                assert_eq!(p.timestamp, 1700000000000);
            }
            other => panic!("expected odds:updated, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_bet_validated() {
        let raw = json!({
            "type": "bet:validated",
            "payload": {
                "bet_id": "w1",
                "user_id": "u1",
                "match_id": "m1",
                "amount": 25.0,
                "odds": 1.85,
                "status": "Validated"
            }
        })
        .to_string();

        let event = FeedEvent::decode(&raw).unwrap();
        assert_eq!(event.kind(), EventKind::BetValidated);
        let (bet_id, status) = event.resolved_bet().unwrap();
        assert_eq!(bet_id, &BetId::from("w1"));
        assert_eq!(status, BetStatus::Validated);
    }

    #[test]
    fn test_decode_bet_rejected() {
        let raw = json!({
            "type": "bet:rejected",
            "payload": {
                "bet_id": "w2",
                "user_id": "u1",
                "match_id": "m1",
                "amount": 10.0,
                "odds": 2.4,
                "status": "Rejected"
            }
        })
        .to_string();

        let event = FeedEvent::decode(&raw).unwrap();
        let (bet_id, status) = event.resolved_bet().unwrap();
        assert_eq!(bet_id, &BetId::from("w2"));
        assert_eq!(status, BetStatus::Rejected);
    }

    #[test]
    fn test_decode_match_status_changed() {
        let raw = json!({
            "type": "match:status_changed",
            "payload": {"match_id": "m3", "status": "suspended"}
        })
        .to_string();

        let event = FeedEvent::decode(&raw).unwrap();
        assert_eq!(event.kind(), EventKind::MatchStatusChanged);
        assert!(event.resolved_bet().is_none());
        match event {
            FeedEvent::MatchStatusChanged(p) => assert_eq!(p.status, MatchStatus::Suspended),
            other => panic!("expected match:status_changed, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_kind_fails() {
        let raw = json!({"type": "odds:exploded", "payload": {}}).to_string();
        assert!(FeedEvent::decode(&raw).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(FeedEvent::decode("not json at all").is_err());
        // Heartbeat tokens are not frames; the codec must reject them
        assert!(FeedEvent::decode(PONG_TOKEN).is_err());
    }

    #[test]
    fn test_encode_frame_shape() {
        let raw = encode_frame("bets:subscribe", &json!({"user_id": "u1"})).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "bets:subscribe");
        assert_eq!(value["payload"]["user_id"], "u1");
    }

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::OddsUpdated.as_str(), "odds:updated");
        assert_eq!(EventKind::BetValidated.as_str(), "bet:validated");
        assert_eq!(EventKind::BetRejected.as_str(), "bet:rejected");
        assert_eq!(EventKind::MatchStatusChanged.as_str(), "match:status_changed");
    }
}
