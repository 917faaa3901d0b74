//! In-memory state for the livebet client: the odds board and the bet
//! lifecycle tracker. Both are internally synchronized and shared by `Arc`.

pub mod bet_tracker;
pub mod odds_board;

pub use bet_tracker::{BetTracker, PendingBet, DEFAULT_LOG_CAPACITY};
pub use odds_board::OddsBoard;
