//! Real-time betting feed client.
//!
//! Orchestrates the WebSocket feed, the local odds board, the bet tracker,
//! and the REST submission gateway.

pub mod app;
pub mod config;
pub mod error;
pub mod gateway;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use gateway::{BetGateway, PlacedBet, RestBetGateway};
