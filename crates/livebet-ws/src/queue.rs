//! Outbound message queue.
//!
//! Buffers frames issued while the link is down and replays them on the next
//! successful open. Bounded: enqueue at capacity evicts the oldest entry, so
//! recency wins over completeness (queued frames are live commands that lose
//! value with age). Entries older than the TTL are dropped at flush time
//! without being sent.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// A frame waiting for the link to come back.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub payload: String,
    pub enqueued_at: Instant,
}

/// Result of draining the queue on reconnect.
#[derive(Debug, Default)]
pub struct FlushOutcome {
    /// Frames still within the TTL, in original enqueue order.
    pub sendable: Vec<String>,
    /// Number of entries discarded for exceeding the TTL.
    pub expired: usize,
}

/// Bounded FIFO of outbound frames.
#[derive(Debug)]
pub struct MessageQueue {
    entries: VecDeque<QueuedMessage>,
    capacity: usize,
    ttl: Duration,
}

impl MessageQueue {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            ttl,
        }
    }

    /// Append a frame. Returns true if an older entry was evicted to make room.
    pub fn push(&mut self, payload: String) -> bool {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            true
        } else {
            false
        };
        self.entries.push_back(QueuedMessage {
            payload,
            enqueued_at: Instant::now(),
        });
        evicted
    }

    /// Drain the queue unconditionally.
    ///
    /// Every entry is removed; only entries younger than the TTL are returned
    /// for transmission, in enqueue order. Staleness gates transmission, not
    /// removal.
    pub fn flush(&mut self) -> FlushOutcome {
        let now = Instant::now();
        let mut outcome = FlushOutcome::default();
        for entry in self.entries.drain(..) {
            if now.duration_since(entry.enqueued_at) < self.ttl {
                outcome.sendable.push(entry.payload);
            } else {
                outcome.expired += 1;
            }
        }
        outcome
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize) -> MessageQueue {
        MessageQueue::new(capacity, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_within_capacity() {
        let mut q = queue(3);
        assert!(!q.push("a".into()));
        assert!(!q.push("b".into()));
        assert_eq!(q.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_at_capacity_evicts_oldest() {
        let mut q = queue(3);
        q.push("a".into());
        q.push("b".into());
        q.push("c".into());
        assert!(q.push("d".into()));
        assert_eq!(q.len(), 3);

        let flushed = q.flush();
        assert_eq!(flushed.sendable, vec!["b", "c", "d"]);
        assert!(q.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_preserves_enqueue_order() {
        let mut q = queue(10);
        for i in 0..5 {
            q.push(format!("msg-{i}"));
        }
        let flushed = q.flush();
        assert_eq!(
            flushed.sendable,
            vec!["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]
        );
        assert_eq!(flushed.expired, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_drops_expired_entries() {
        let mut q = queue(10);
        q.push("stale-1".into());
        q.push("stale-2".into());

        // Age the first two past the 60s TTL, then enqueue a fresh one
        tokio::time::advance(Duration::from_secs(61)).await;
        q.push("fresh".into());

        let flushed = q.flush();
        assert_eq!(flushed.sendable, vec!["fresh"]);
        assert_eq!(flushed.expired, 2);
        // The queue is drained even for entries that were not sent
        assert!(q.is_empty());
    }
}
