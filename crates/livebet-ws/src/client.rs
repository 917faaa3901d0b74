//! Connection lifecycle state machine.
//!
//! `SocketClient` owns a driver task that runs the connect / heartbeat /
//! reconnect cycle. The public API is non-blocking: calls post commands to
//! the driver over an unbounded channel, so `send` while offline simply
//! lands in the outbound queue and is replayed on the next open link.
//!
//! State transitions:
//! `Disconnected -> Connecting -> Connected`, with `Reconnecting` between a
//! lost link and the next attempt. `disconnect` always lands in
//! `Disconnected` and suppresses reconnection; exhausting the attempt cap
//! does the same.

use crate::backoff::ReconnectPolicy;
use crate::error::WsResult;
use crate::message::{
    EventKind, FeedEvent, HEARTBEAT_CLOSE_CODE, NORMAL_CLOSE_CODE, PING_TOKEN, PONG_TOKEN,
};
use crate::queue::MessageQueue;
use crate::router::{EventRouter, Subscription};
use crate::transport::{LinkEvent, Transport, TransportLink, WsTransport};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Connection state visible to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// WebSocket URL.
    pub url: String,
    /// Whether lost links are reconnected automatically.
    pub auto_reconnect: bool,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
    /// Attempt cap; exceeding it gives up and settles in `Disconnected`.
    pub max_reconnect_attempts: u32,
    /// Interval between heartbeat pings.
    pub heartbeat_interval_ms: u64,
    /// Pong must arrive within this after a ping.
    pub heartbeat_timeout_ms: u64,
    /// Outbound queue capacity; enqueue at capacity evicts the oldest.
    pub queue_capacity: usize,
    /// Queued frames older than this are dropped at flush time.
    pub queue_ttl_ms: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auto_reconnect: true,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30000,
            max_reconnect_attempts: 15,
            heartbeat_interval_ms: 30000,
            heartbeat_timeout_ms: 5000,
            queue_capacity: 100,
            queue_ttl_ms: 60000,
        }
    }
}

/// Snapshot of the client's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketStats {
    pub reconnects: u64,
    pub events_dispatched: u64,
    pub frames_dropped: u64,
    pub queue_evictions: u64,
    pub queue_expired: u64,
    pub heartbeat_timeouts: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    reconnects: AtomicU64,
    events_dispatched: AtomicU64,
    frames_dropped: AtomicU64,
    queue_evictions: AtomicU64,
    queue_expired: AtomicU64,
    heartbeat_timeouts: AtomicU64,
}

impl StatCounters {
    fn snapshot(&self) -> SocketStats {
        SocketStats {
            reconnects: self.reconnects.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            queue_evictions: self.queue_evictions.load(Ordering::Relaxed),
            queue_expired: self.queue_expired.load(Ordering::Relaxed),
            heartbeat_timeouts: self.heartbeat_timeouts.load(Ordering::Relaxed),
        }
    }
}

type StateObserver = Arc<dyn Fn(ConnectionState) + Send + Sync>;

enum Command {
    Connect,
    Disconnect,
    Send(String),
}

/// How a connected session ended.
enum SessionEnd {
    /// Link lost or declared dead; reconnection may follow.
    Closed,
    /// Orderly `disconnect`; no reconnection.
    Disconnect,
    /// Client handle dropped; driver exits.
    Halt,
}

/// How one connect/reconnect cycle ended.
enum CycleEnd {
    /// Back to idle, waiting for the next `connect` call.
    Idle,
    Halt,
}

enum BackoffOutcome {
    Elapsed,
    ConnectNow,
    Disconnect,
    Halt,
}

struct ClientShared {
    config: SocketConfig,
    state: RwLock<ConnectionState>,
    router: EventRouter,
    observers: RwLock<Vec<StateObserver>>,
    queue: Mutex<MessageQueue>,
    stats: StatCounters,
}

impl ClientShared {
    fn set_state(&self, next: ConnectionState) {
        {
            let mut state = self.state.write();
            if *state == next {
                return;
            }
            *state = next;
        }
        debug!(state = %next, "Connection state changed");
        let observers: Vec<StateObserver> = self.observers.read().clone();
        for observer in observers {
            observer(next);
        }
    }

    fn enqueue(&self, frame: String) {
        let evicted = self.queue.lock().push(frame);
        if evicted {
            self.stats.queue_evictions.fetch_add(1, Ordering::Relaxed);
            warn!("Outbound queue full, dropped oldest frame");
        }
    }

    fn dispatch_frame(&self, raw: &str) {
        match FeedEvent::decode(raw) {
            Ok(event) => {
                self.stats.events_dispatched.fetch_add(1, Ordering::Relaxed);
                self.router.dispatch(&event);
            }
            Err(e) => {
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Malformed frame dropped");
            }
        }
    }
}

/// Reconnecting WebSocket client for the livebet feed.
pub struct SocketClient {
    shared: Arc<ClientShared>,
    command_tx: mpsc::UnboundedSender<Command>,
}

impl SocketClient {
    /// Create a client over the production transport. The driver task starts
    /// immediately but stays idle until `connect` is called.
    pub fn new(config: SocketConfig) -> Self {
        Self::with_transport(config, Arc::new(WsTransport::new()))
    }

    /// Create a client over an arbitrary transport (tests inject mocks here).
    pub fn with_transport(config: SocketConfig, transport: Arc<dyn Transport>) -> Self {
        let queue = MessageQueue::new(
            config.queue_capacity,
            Duration::from_millis(config.queue_ttl_ms),
        );
        let shared = Arc::new(ClientShared {
            config,
            state: RwLock::new(ConnectionState::Disconnected),
            router: EventRouter::new(),
            observers: RwLock::new(Vec::new()),
            queue: Mutex::new(queue),
            stats: StatCounters::default(),
        });

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_driver(shared.clone(), transport, command_rx));

        Self { shared, command_tx }
    }

    /// Begin connecting. During backoff this retries immediately; while
    /// connected it is a no-op.
    pub fn connect(&self) {
        let _ = self.command_tx.send(Command::Connect);
    }

    /// Close the link with code 1000 and settle in `Disconnected` without
    /// scheduling a reconnect.
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(Command::Disconnect);
    }

    /// Transmit a frame, or queue it if the link is down.
    pub fn send(&self, frame: String) {
        let _ = self.command_tx.send(Command::Send(frame));
    }

    /// Encode and send a `{"type", "payload"}` command frame.
    pub fn send_event<T: serde::Serialize>(&self, kind: &str, payload: &T) -> WsResult<()> {
        let frame = crate::message::encode_frame(kind, payload)?;
        self.send(frame);
        Ok(())
    }

    /// Register a callback for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        self.shared.router.subscribe(kind, callback)
    }

    /// Register a callback for every event.
    pub fn subscribe_any<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        self.shared.router.subscribe_any(callback)
    }

    /// Register a state observer, invoked on every transition.
    pub fn on_state_change<F>(&self, observer: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.shared.observers.write().push(Arc::new(observer));
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    pub fn stats(&self) -> SocketStats {
        self.shared.stats.snapshot()
    }

    /// Number of frames currently waiting for a link.
    pub fn queued_len(&self) -> usize {
        self.shared.queue.lock().len()
    }
}

async fn run_driver(
    shared: Arc<ClientShared>,
    transport: Arc<dyn Transport>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    loop {
        // Idle until told to connect. Frames sent while idle are queued.
        match commands.recv().await {
            None => break,
            Some(Command::Disconnect) => continue,
            Some(Command::Send(frame)) => {
                shared.enqueue(frame);
                continue;
            }
            Some(Command::Connect) => {}
        }

        match run_cycle(&shared, transport.as_ref(), &mut commands).await {
            CycleEnd::Idle => {}
            CycleEnd::Halt => break,
        }
    }
    shared.set_state(ConnectionState::Disconnected);
}

/// One connect/reconnect cycle: runs until the client settles in
/// `Disconnected` (orderly disconnect or attempt cap) or the handle drops.
async fn run_cycle(
    shared: &Arc<ClientShared>,
    transport: &dyn Transport,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> CycleEnd {
    let config = &shared.config;
    let policy = ReconnectPolicy::new(config.reconnect_base_delay_ms, config.reconnect_max_delay_ms);
    let mut attempt = 0u32;

    loop {
        shared.set_state(ConnectionState::Connecting);

        match transport.connect(&config.url).await {
            Ok(mut link) => {
                attempt = 0;
                info!(url = %config.url, "WebSocket connected");
                shared.set_state(ConnectionState::Connected);

                let flushed = flush_queue(shared, link.as_mut()).await;
                let end = if flushed {
                    drive_connected(shared, link.as_mut(), commands).await
                } else {
                    SessionEnd::Closed
                };

                match end {
                    SessionEnd::Closed => {}
                    SessionEnd::Disconnect => {
                        shared.set_state(ConnectionState::Disconnected);
                        return CycleEnd::Idle;
                    }
                    SessionEnd::Halt => return CycleEnd::Halt,
                }
            }
            Err(e) => {
                warn!(error = %e, "WebSocket connect failed");
            }
        }

        if !config.auto_reconnect {
            shared.set_state(ConnectionState::Disconnected);
            return CycleEnd::Idle;
        }

        attempt += 1;
        if attempt > config.max_reconnect_attempts {
            error!(
                attempts = config.max_reconnect_attempts,
                "Max reconnection attempts reached, giving up"
            );
            shared.set_state(ConnectionState::Disconnected);
            return CycleEnd::Idle;
        }

        shared.stats.reconnects.fetch_add(1, Ordering::Relaxed);
        shared.set_state(ConnectionState::Reconnecting);

        let delay = policy.delay_for_attempt(attempt);
        warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

        match backoff_wait(shared, commands, delay).await {
            BackoffOutcome::Elapsed => {}
            // Retry at once; the counter still only resets on a successful open
            BackoffOutcome::ConnectNow => {}
            BackoffOutcome::Disconnect => {
                shared.set_state(ConnectionState::Disconnected);
                return CycleEnd::Idle;
            }
            BackoffOutcome::Halt => return CycleEnd::Halt,
        }
    }
}

/// Replay queued frames on a fresh link. Returns false if the link died
/// mid-flush; undelivered frames go back to the queue.
async fn flush_queue(shared: &Arc<ClientShared>, link: &mut dyn TransportLink) -> bool {
    let outcome = shared.queue.lock().flush();
    if outcome.expired > 0 {
        shared
            .stats
            .queue_expired
            .fetch_add(outcome.expired as u64, Ordering::Relaxed);
        warn!(expired = outcome.expired, "Dropped stale queued frames");
    }

    let total = outcome.sendable.len();
    let mut pending = outcome.sendable.into_iter();
    while let Some(frame) = pending.next() {
        if let Err(e) = link.send(frame.clone()).await {
            warn!(error = %e, "Link died during queue flush");
            shared.enqueue(frame);
            for rest in pending {
                shared.enqueue(rest);
            }
            return false;
        }
    }
    if total > 0 {
        info!(count = total, "Flushed outbound queue");
    }
    true
}

/// Select loop for an open link: commands, inbound events, heartbeat.
async fn drive_connected(
    shared: &Arc<ClientShared>,
    link: &mut dyn TransportLink,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd {
    let config = &shared.config;
    let hb_interval = Duration::from_millis(config.heartbeat_interval_ms);
    let hb_timeout = Duration::from_millis(config.heartbeat_timeout_ms);

    let mut ping_timer = interval_at(Instant::now() + hb_interval, hb_interval);
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Armed while a ping is outstanding; cleared by the matching pong
    let mut pong_deadline: Option<Instant> = None;

    loop {
        let pong_at = pong_deadline;
        let deadline = async move {
            match pong_at {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(frame)) => {
                    if let Err(e) = link.send(frame.clone()).await {
                        warn!(error = %e, "Send failed, requeueing frame");
                        shared.enqueue(frame);
                        return SessionEnd::Closed;
                    }
                }
                Some(Command::Connect) => {}
                Some(Command::Disconnect) => {
                    info!("Disconnecting");
                    let _ = link.close(NORMAL_CLOSE_CODE).await;
                    return SessionEnd::Disconnect;
                }
                None => {
                    let _ = link.close(NORMAL_CLOSE_CODE).await;
                    return SessionEnd::Halt;
                }
            },

            event = link.recv() => match event {
                Some(LinkEvent::Text(text)) => {
                    if text == PONG_TOKEN {
                        pong_deadline = None;
                    } else {
                        shared.dispatch_frame(&text);
                    }
                }
                Some(LinkEvent::Closed { code, reason }) => {
                    warn!(code, %reason, "WebSocket closed by peer");
                    return SessionEnd::Closed;
                }
                None => {
                    warn!("WebSocket stream ended");
                    return SessionEnd::Closed;
                }
            },

            _ = ping_timer.tick() => {
                if let Err(e) = link.send(PING_TOKEN.to_string()).await {
                    warn!(error = %e, "Heartbeat ping failed");
                    return SessionEnd::Closed;
                }
                if pong_deadline.is_none() {
                    pong_deadline = Some(Instant::now() + hb_timeout);
                }
            },

            _ = deadline => {
                shared.stats.heartbeat_timeouts.fetch_add(1, Ordering::Relaxed);
                error!(timeout_ms = config.heartbeat_timeout_ms, "Heartbeat timeout, closing link");
                let _ = link.close(HEARTBEAT_CLOSE_CODE).await;
                return SessionEnd::Closed;
            },
        }
    }
}

/// Wait out a backoff delay, still servicing commands.
async fn backoff_wait(
    shared: &Arc<ClientShared>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    delay: Duration,
) -> BackoffOutcome {
    let deadline = Instant::now() + delay;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => return BackoffOutcome::Elapsed,
            command = commands.recv() => match command {
                Some(Command::Send(frame)) => shared.enqueue(frame),
                Some(Command::Connect) => return BackoffOutcome::ConnectNow,
                Some(Command::Disconnect) => return BackoffOutcome::Disconnect,
                None => return BackoffOutcome::Halt,
            },
        }
    }
}
