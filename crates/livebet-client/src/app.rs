//! Main application orchestration.
//!
//! Wires the WebSocket client to the odds board and the bet tracker:
//! feed events update local state, bet submissions go out over the REST
//! gateway, and their confirmations come back asynchronously on the feed.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::gateway::{BetGateway, PlacedBet, RestBetGateway};
use livebet_core::BetTicket;
use livebet_state::{BetTracker, OddsBoard};
use livebet_telemetry::Metrics;
use livebet_ws::{EventKind, FeedEvent, SocketClient, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, Instant};
use tracing::{info, warn};

/// Periodic stats log interval.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// How long a one-shot bet waits for its confirmation.
const BET_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Main application.
pub struct Application {
    socket: Arc<SocketClient>,
    odds: Arc<OddsBoard>,
    bets: Arc<BetTracker>,
    gateway: Arc<dyn BetGateway>,
    // Held so feed subscriptions outlive construction
    _subscriptions: Vec<Subscription>,
}

impl Application {
    pub fn new(config: &AppConfig) -> Self {
        let socket = Arc::new(SocketClient::new(config.socket_config()));
        let gateway = Arc::new(RestBetGateway::new(config.api_url.clone()));
        Self::with_parts(config, socket, gateway)
    }

    /// Assemble from explicit parts (tests inject mocks here).
    pub fn with_parts(
        config: &AppConfig,
        socket: Arc<SocketClient>,
        gateway: Arc<dyn BetGateway>,
    ) -> Self {
        let odds = Arc::new(OddsBoard::new());
        let bets = Arc::new(BetTracker::with_log_capacity(
            config.state.activity_log_capacity,
        ));

        let subscriptions = wire_feed(&socket, &odds, &bets);

        socket.on_state_change(|state| {
            info!(%state, "Connection state changed");
            Metrics::ws_state_set(state.as_str());
        });

        Self {
            socket,
            odds,
            bets,
            gateway,
            _subscriptions: subscriptions,
        }
    }

    pub fn socket(&self) -> &SocketClient {
        &self.socket
    }

    pub fn odds(&self) -> &Arc<OddsBoard> {
        &self.odds
    }

    pub fn bets(&self) -> &Arc<BetTracker> {
        &self.bets
    }

    /// Submit a bet and start tracking it as pending.
    pub async fn place_bet(&self, ticket: BetTicket) -> AppResult<PlacedBet> {
        ticket.validate()?;

        let placed = self.gateway.place_bet(&ticket).await?;
        info!(bet_id = %placed.bet_id, status = %placed.status, "Bet submitted");

        // An already-resolved acknowledgement needs no feed confirmation
        if !placed.status.is_resolved() {
            self.bets.track_pending(placed.bet_id.clone(), ticket);
            Metrics::bets_pending_set(self.bets.pending_len() as i64);
        }
        Ok(placed)
    }

    /// Connect and run until interrupted.
    pub async fn run(&self) -> AppResult<()> {
        self.socket.connect();

        let mut stats_timer = interval(STATS_INTERVAL);
        stats_timer.tick().await;

        loop {
            tokio::select! {
                _ = stats_timer.tick() => self.log_summary(),
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.socket.disconnect();
        self.log_summary();
        Ok(())
    }

    /// Connect, place one bet, and wait for its confirmation on the feed.
    pub async fn run_bet(&self, ticket: BetTicket) -> AppResult<()> {
        self.socket.connect();

        let placed = self.place_bet(ticket).await?;
        if placed.status.is_resolved() {
            info!(bet_id = %placed.bet_id, status = %placed.status, "Bet resolved on submission");
            self.socket.disconnect();
            return Ok(());
        }

        let waited = timeout(BET_RESOLUTION_TIMEOUT, async {
            let start = Instant::now();
            let mut poll = interval(Duration::from_millis(100));
            while self.bets.is_pending(&placed.bet_id) {
                poll.tick().await;
            }
            start.elapsed()
        })
        .await;

        match waited {
            Ok(elapsed) => match self.bets.last_settled() {
                Some((bet_id, status)) if bet_id == placed.bet_id => {
                    info!(%bet_id, %status, elapsed_ms = elapsed.as_millis() as u64, "Bet resolved");
                }
                _ => info!(bet_id = %placed.bet_id, "Bet no longer pending"),
            },
            Err(_) => warn!(bet_id = %placed.bet_id, "Timed out waiting for confirmation"),
        }

        self.socket.disconnect();
        Ok(())
    }

    fn log_summary(&self) {
        let stats = self.socket.stats();
        Metrics::queue_depth_set(self.socket.queued_len() as i64);
        Metrics::bets_pending_set(self.bets.pending_len() as i64);
        info!(
            state = %self.socket.state(),
            matches = self.odds.len(),
            board_version = self.odds.version(),
            pending_bets = self.bets.pending_len(),
            unmatched = self.bets.unmatched_resolutions(),
            reconnects = stats.reconnects,
            events = stats.events_dispatched,
            dropped = stats.frames_dropped,
            "Status"
        );
    }
}

/// Attach feed subscriptions that keep local state current.
fn wire_feed(
    socket: &SocketClient,
    odds: &Arc<OddsBoard>,
    bets: &Arc<BetTracker>,
) -> Vec<Subscription> {
    let mut subscriptions = Vec::new();

    subscriptions.push(socket.subscribe_any(|event| {
        Metrics::event_dispatched(event.kind().as_str());
    }));

    let board = odds.clone();
    subscriptions.push(socket.subscribe(EventKind::OddsUpdated, move |event| {
        if let FeedEvent::OddsUpdated(p) = event {
            board.update(p.match_id.clone(), p.odds);
        }
    }));

    // Status changes never mutate the board; removal is an explicit
    // operation on the cache, not a feed side effect
    subscriptions.push(socket.subscribe(EventKind::MatchStatusChanged, |event| {
        if let FeedEvent::MatchStatusChanged(p) = event {
            info!(match_id = %p.match_id, status = %p.status, "Match status changed");
        }
    }));

    for kind in [EventKind::BetValidated, EventKind::BetRejected] {
        let tracker = bets.clone();
        subscriptions.push(socket.subscribe(kind, move |event| {
            let Some((bet_id, status)) = event.resolved_bet() else {
                return;
            };
            match tracker.resolve(bet_id, status) {
                Some(latency_ms) => {
                    Metrics::bet_resolved(&status.to_string(), latency_ms as f64);
                    Metrics::bets_pending_set(tracker.pending_len() as i64);
                }
                None => Metrics::bet_unmatched(),
            }
        }));
    }

    subscriptions
}
