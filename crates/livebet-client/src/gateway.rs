//! Bet submission gateway.
//!
//! Bets are placed over REST; their confirmation arrives asynchronously on
//! the feed as `bet:validated` / `bet:rejected` events.

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use livebet_core::{BetId, BetStatus, BetTicket};
use serde::Deserialize;
use tracing::debug;

/// Server's acknowledgement of a submitted bet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacedBet {
    pub bet_id: BetId,
    pub status: BetStatus,
}

/// Submission seam; tests substitute a scripted gateway.
#[async_trait]
pub trait BetGateway: Send + Sync {
    async fn place_bet(&self, ticket: &BetTicket) -> AppResult<PlacedBet>;
}

/// REST gateway against the betting backend.
pub struct RestBetGateway {
    client: reqwest::Client,
    base_url: String,
}

impl RestBetGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BetGateway for RestBetGateway {
    async fn place_bet(&self, ticket: &BetTicket) -> AppResult<PlacedBet> {
        let url = format!("{}/bets", self.base_url);
        debug!(%url, match_id = %ticket.match_id, "Submitting bet");

        let response = self
            .client
            .post(&url)
            .json(ticket)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Submission failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Submission rejected: {status}: {body}"
            )));
        }

        response
            .json::<PlacedBet>()
            .await
            .map_err(|e| AppError::Gateway(format!("Malformed submission response: {e}")))
    }
}
