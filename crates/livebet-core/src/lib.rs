//! Core domain types for the livebet client.
//!
//! This crate provides the fundamental types shared across the system:
//! - `MatchId`, `BetId`, `UserId`: identifier newtypes
//! - `BetTicket`: a wager request with validation
//! - `BetStatus`, `MatchStatus`: lifecycle enums
//! - `OddsEntry`, `ActivityLogEntry`: state-layer records

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{
    ActivityLogEntry, BetId, BetStatus, BetTicket, MatchId, MatchStatus, OddsEntry, UserId,
    MIN_ODDS,
};
