//! Common domain types.
//!
//! Identifiers are transparent string newtypes: the wire carries UUIDs as
//! strings, but nothing in this core depends on UUID-ness.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum semantically valid payout multiplier.
pub const MIN_ODDS: Decimal = Decimal::ONE;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a market (a match with a live price).
    MatchId
);
id_newtype!(
    /// Identifier of a submitted wager, assigned by the submission path.
    BetId
);
id_newtype!(
    /// Identifier of the wagering user.
    UserId
);

/// A user's request to stake an amount at a given price on a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetTicket {
    pub user_id: UserId,
    pub match_id: MatchId,
    /// Stake amount.
    pub amount: Decimal,
    /// Payout multiplier the stake was placed at.
    pub odds: Decimal,
}

impl BetTicket {
    pub fn new(
        user_id: impl Into<UserId>,
        match_id: impl Into<MatchId>,
        amount: Decimal,
        odds: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            match_id: match_id.into(),
            amount,
            odds,
        }
    }

    /// Validate the ticket before submission.
    ///
    /// Rejects non-positive stakes and odds below 1.0 (a multiplier below
    /// one would pay out less than the stake).
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount(self.amount));
        }
        if self.odds < MIN_ODDS {
            return Err(CoreError::OddsBelowMinimum(self.odds));
        }
        Ok(())
    }
}

/// Resolution state of a wager.
///
/// `Pending` only exists between submission and the asynchronous
/// confirmation; resolved log entries are always Validated or Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    Pending,
    Validated,
    Rejected,
}

impl BetStatus {
    /// Check whether this status resolves a pending wager.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Validated => write!(f, "Validated"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Lifecycle state of a match as broadcast by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
    Suspended,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Live => write!(f, "live"),
            Self::Finished => write!(f, "finished"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

/// Latest known price for a match.
///
/// Overwritten whole on every update; never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsEntry {
    /// Payout multiplier, semantically >= 1.0.
    pub odds: Decimal,
    /// Receipt timestamp of the update that produced this entry.
    pub last_updated: DateTime<Utc>,
}

impl OddsEntry {
    pub fn new(odds: Decimal) -> Self {
        Self {
            odds,
            last_updated: Utc::now(),
        }
    }

    pub fn at(odds: Decimal, last_updated: DateTime<Utc>) -> Self {
        Self { odds, last_updated }
    }

    /// Age of this entry in milliseconds.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.last_updated).num_milliseconds()
    }
}

/// One resolved wager, as recorded in the bounded activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Resolution timestamp.
    pub timestamp: DateTime<Utc>,
    /// Stake amount of the resolved wager.
    pub amount: Decimal,
    /// Submission-to-resolution round trip in milliseconds.
    pub latency_ms: u64,
    /// Terminal status (never Pending).
    pub status: BetStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ticket(amount: Decimal, odds: Decimal) -> BetTicket {
        BetTicket::new("user-1", "match-1", amount, odds)
    }

    #[test]
    fn test_ticket_validation_ok() {
        assert!(ticket(dec!(25), dec!(1.85)).validate().is_ok());
        // Odds of exactly 1.0 are a valid (if pointless) multiplier
        assert!(ticket(dec!(1), dec!(1)).validate().is_ok());
    }

    #[test]
    fn test_ticket_validation_rejects_non_positive_amount() {
        assert!(matches!(
            ticket(dec!(0), dec!(2)).validate(),
            Err(CoreError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            ticket(dec!(-5), dec!(2)).validate(),
            Err(CoreError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_ticket_validation_rejects_sub_unity_odds() {
        assert!(matches!(
            ticket(dec!(10), dec!(0.95)).validate(),
            Err(CoreError::OddsBelowMinimum(_))
        ));
    }

    #[test]
    fn test_bet_status_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&BetStatus::Validated).unwrap(),
            "\"Validated\""
        );
        let status: BetStatus = serde_json::from_str("\"Rejected\"").unwrap();
        assert_eq!(status, BetStatus::Rejected);
        assert!(status.is_resolved());
        assert!(!BetStatus::Pending.is_resolved());
    }

    #[test]
    fn test_match_status_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::Suspended).unwrap(),
            "\"suspended\""
        );
        let status: MatchStatus = serde_json::from_str("\"live\"").unwrap();
        assert_eq!(status, MatchStatus::Live);
    }

    #[test]
    fn test_id_newtype_is_transparent() {
        let id = MatchId::new("m1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"m1\"");
        assert_eq!(id.to_string(), "m1");
        assert_eq!(id.as_str(), "m1");
    }

    #[test]
    fn test_ticket_wire_shape() {
        let json = serde_json::to_value(ticket(dec!(25), dec!(1.85))).unwrap();
        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["match_id"], "match-1");
        // serde-float: amounts and odds cross the wire as JSON numbers
        assert!(json["amount"].is_number());
        assert!(json["odds"].is_number());
    }

    #[test]
    fn test_odds_entry_age() {
        let entry = OddsEntry::new(dec!(2.1));
        assert!(entry.age_ms() >= 0);
        assert_eq!(entry.odds, dec!(2.1));
    }
}
