//! Application configuration.

use crate::error::{AppError, AppResult};
use livebet_ws::SocketConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Feed WebSocket URL.
    pub ws_url: String,
    /// Bet submission REST base URL.
    pub api_url: String,
    #[serde(default)]
    pub socket: SocketSettings,
    #[serde(default)]
    pub state: StateSettings,
}

/// Connection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketSettings {
    /// Reconnect automatically on lost links. Default: true.
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
    /// Base backoff delay (ms). Default: 1,000.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Backoff delay cap (ms). Default: 30,000.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Reconnection attempt cap. Default: 15.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Heartbeat ping interval (ms). Default: 30,000.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Pong deadline after a ping (ms). Default: 5,000.
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    /// Outbound queue capacity. Default: 100.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Queued frame TTL (ms). Default: 60,000.
    #[serde(default = "default_queue_ttl_ms")]
    pub queue_ttl_ms: u64,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_base_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_max_reconnect_attempts() -> u32 {
    15
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    5_000
}

fn default_queue_capacity() -> usize {
    100
}

fn default_queue_ttl_ms() -> u64 {
    60_000
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            auto_reconnect: default_auto_reconnect(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            queue_capacity: default_queue_capacity(),
            queue_ttl_ms: default_queue_ttl_ms(),
        }
    }
}

/// State tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSettings {
    /// Retained activity log entries. Default: 50.
    #[serde(default = "default_activity_log_capacity")]
    pub activity_log_capacity: usize,
}

fn default_activity_log_capacity() -> usize {
    50
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            activity_log_capacity: default_activity_log_capacity(),
        }
    }
}

impl AppConfig {
    /// Load from `LIVEBET_CONFIG` or the default path.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("LIVEBET_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::from_file(&config_path)
    }

    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Socket configuration for the WebSocket client.
    pub fn socket_config(&self) -> SocketConfig {
        SocketConfig {
            url: self.ws_url.clone(),
            auto_reconnect: self.socket.auto_reconnect,
            reconnect_base_delay_ms: self.socket.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.socket.reconnect_max_delay_ms,
            max_reconnect_attempts: self.socket.max_reconnect_attempts,
            heartbeat_interval_ms: self.socket.heartbeat_interval_ms,
            heartbeat_timeout_ms: self.socket.heartbeat_timeout_ms,
            queue_capacity: self.socket.queue_capacity,
            queue_ttl_ms: self.socket.queue_ttl_ms,
        }
    }
}
