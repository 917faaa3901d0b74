//! Bet lifecycle tracking.
//!
//! A submitted bet is tracked as pending until the feed confirms or rejects
//! it. Resolution measures the submission-to-confirmation round trip and
//! appends to a bounded, newest-first activity log. A resolution for a bet
//! that was never tracked (or already resolved) is dropped, but counted so
//! the mismatch is visible.

use livebet_core::{ActivityLogEntry, BetId, BetStatus, BetTicket};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default cap on retained activity log entries.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// A bet awaiting its confirmation event.
#[derive(Debug, Clone)]
pub struct PendingBet {
    pub ticket: BetTicket,
    /// Submission time, for latency measurement.
    pub sent_at: Instant,
}

/// Tracks in-flight bets and the recent resolution history.
pub struct BetTracker {
    pending: DashMap<BetId, PendingBet>,
    log: RwLock<VecDeque<ActivityLogEntry>>,
    log_capacity: usize,
    last_settled: RwLock<Option<(BetId, BetStatus)>>,
    unmatched_resolutions: AtomicU64,
}

impl BetTracker {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(log_capacity: usize) -> Self {
        Self {
            pending: DashMap::new(),
            log: RwLock::new(VecDeque::with_capacity(log_capacity)),
            log_capacity,
            last_settled: RwLock::new(None),
            unmatched_resolutions: AtomicU64::new(0),
        }
    }

    /// Record a submitted bet; the clock for its latency starts now.
    pub fn track_pending(&self, bet_id: BetId, ticket: BetTicket) {
        debug!(bet_id = %bet_id, "Tracking pending bet");
        self.pending.insert(
            bet_id,
            PendingBet {
                ticket,
                sent_at: Instant::now(),
            },
        );
    }

    /// Settle a pending bet with its terminal status.
    ///
    /// Returns the measured latency, or `None` for an unknown bet id (the
    /// resolution is dropped and counted, never retroactively logged).
    pub fn resolve(&self, bet_id: &BetId, status: BetStatus) -> Option<u64> {
        debug_assert!(status.is_resolved());

        let Some((_, pending)) = self.pending.remove(bet_id) else {
            self.unmatched_resolutions.fetch_add(1, Ordering::Relaxed);
            warn!(bet_id = %bet_id, ?status, "Resolution for unknown bet dropped");
            return None;
        };

        let latency_ms = pending.sent_at.elapsed().as_millis() as u64;
        let entry = ActivityLogEntry {
            timestamp: Utc::now(),
            amount: pending.ticket.amount,
            latency_ms,
            status,
        };

        {
            let mut log = self.log.write();
            log.push_front(entry);
            log.truncate(self.log_capacity);
        }
        *self.last_settled.write() = Some((bet_id.clone(), status));

        debug!(bet_id = %bet_id, ?status, latency_ms, "Bet resolved");
        Some(latency_ms)
    }

    pub fn is_pending(&self, bet_id: &BetId) -> bool {
        self.pending.contains_key(bet_id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Resolution history, newest first.
    pub fn activity_log(&self) -> Vec<ActivityLogEntry> {
        self.log.read().iter().cloned().collect()
    }

    /// Most recently settled bet, if any.
    pub fn last_settled(&self) -> Option<(BetId, BetStatus)> {
        self.last_settled.read().clone()
    }

    /// Count of resolutions that matched no tracked bet.
    pub fn unmatched_resolutions(&self) -> u64 {
        self.unmatched_resolutions.load(Ordering::Relaxed)
    }

    pub fn clear_log(&self) {
        self.log.write().clear();
    }
}

impl Default for BetTracker {
    fn default() -> Self {
        Self::new()
    }
}
