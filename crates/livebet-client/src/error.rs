//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] livebet_ws::WsError),

    #[error("Invalid bet: {0}")]
    InvalidBet(#[from] livebet_core::CoreError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] livebet_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
