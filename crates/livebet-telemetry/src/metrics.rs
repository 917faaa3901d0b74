//! Prometheus metrics for the livebet client.
//!
//! Covers the connection state machine, the outbound queue, the event
//! router, and the bet lifecycle.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means a duplicate metric name, which should crash at startup rather than
//! fail silently. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, register_int_counter,
    register_int_gauge, CounterVec, GaugeVec, Histogram, IntCounter, IntGauge,
};

/// Connection state machine current state.
/// Labels: state (disconnected/connecting/connected/reconnecting)
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "livebet_ws_state",
        "Connection state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Total reconnection attempts.
pub static WS_RECONNECT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "livebet_ws_reconnect_total",
        "Total WebSocket reconnection attempts"
    )
    .unwrap()
});

/// Total heartbeat timeouts that forced a close.
pub static WS_HEARTBEAT_TIMEOUT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "livebet_ws_heartbeat_timeout_total",
        "Total heartbeat timeouts that forced a close"
    )
    .unwrap()
});

/// Total inbound frames dropped as malformed.
pub static FRAMES_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "livebet_frames_dropped_total",
        "Total inbound frames dropped as malformed"
    )
    .unwrap()
});

/// Events dispatched to subscribers, by kind.
pub static EVENTS_DISPATCHED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "livebet_events_dispatched_total",
        "Events dispatched to subscribers",
        &["kind"]
    )
    .unwrap()
});

/// Frames currently held in the outbound queue.
pub static QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "livebet_queue_depth",
        "Frames currently held in the outbound queue"
    )
    .unwrap()
});

/// Queued frames evicted because the queue was full.
pub static QUEUE_EVICTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "livebet_queue_evicted_total",
        "Queued frames evicted because the queue was full"
    )
    .unwrap()
});

/// Queued frames dropped as stale at flush time.
pub static QUEUE_EXPIRED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "livebet_queue_expired_total",
        "Queued frames dropped as stale at flush time"
    )
    .unwrap()
});

/// Bets currently awaiting confirmation.
pub static BETS_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "livebet_bets_pending",
        "Bets currently awaiting confirmation"
    )
    .unwrap()
});

/// Bet resolutions, by terminal status.
pub static BETS_RESOLVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "livebet_bets_resolved_total",
        "Bet resolutions by terminal status",
        &["status"]
    )
    .unwrap()
});

/// Resolutions that matched no tracked bet.
pub static BETS_UNMATCHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "livebet_bets_unmatched_total",
        "Bet resolutions that matched no tracked bet"
    )
    .unwrap()
});

/// Submission-to-confirmation round trip in milliseconds.
pub static BET_RESOLUTION_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "livebet_bet_resolution_latency_ms",
        "Bet submission-to-confirmation latency in milliseconds",
        vec![10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Set the active connection state.
    /// Only the active state is set to 1, all others to 0.
    pub fn ws_state_set(state: &str) {
        for s in &["disconnected", "connecting", "connected", "reconnecting"] {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Record a reconnection attempt.
    pub fn ws_reconnect() {
        WS_RECONNECT_TOTAL.inc();
    }

    /// Record a heartbeat timeout.
    pub fn heartbeat_timeout() {
        WS_HEARTBEAT_TIMEOUT_TOTAL.inc();
    }

    /// Record a malformed inbound frame.
    pub fn frame_dropped() {
        FRAMES_DROPPED_TOTAL.inc();
    }

    /// Record a dispatched event.
    pub fn event_dispatched(kind: &str) {
        EVENTS_DISPATCHED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Update outbound queue depth.
    pub fn queue_depth_set(depth: i64) {
        QUEUE_DEPTH.set(depth);
    }

    /// Record a capacity eviction.
    pub fn queue_evicted() {
        QUEUE_EVICTED_TOTAL.inc();
    }

    /// Record frames dropped as stale at flush.
    pub fn queue_expired(count: u64) {
        QUEUE_EXPIRED_TOTAL.inc_by(count);
    }

    /// Update pending bet count.
    pub fn bets_pending_set(count: i64) {
        BETS_PENDING.set(count);
    }

    /// Record a bet resolution with its measured latency.
    pub fn bet_resolved(status: &str, latency_ms: f64) {
        BETS_RESOLVED_TOTAL.with_label_values(&[status]).inc();
        BET_RESOLUTION_LATENCY_MS.observe(latency_ms);
    }

    /// Record a resolution that matched no tracked bet.
    pub fn bet_unmatched() {
        BETS_UNMATCHED_TOTAL.inc();
    }
}
