//! Reconnection backoff policy.
//!
//! Exponential delay with uniform jitter so that many clients losing the same
//! server do not retry in lockstep.

use std::time::Duration;

/// Computes the delay before reconnect attempt `n` (1-indexed).
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ReconnectPolicy {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay for attempt `n`: `min(base * 2^(n-1) + jitter, max)` with jitter
    /// uniform in `[0, base)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let exponential = self.base_delay_ms.saturating_mul(1u64 << exponent);
        let delay = exponential
            .saturating_add(jitter_ms(self.base_delay_ms))
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Jitter in `[0, bound)` derived from the system clock's subsecond nanos.
fn jitter_ms(bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % bound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_jittered_bounds() {
        let policy = ReconnectPolicy::new(1000, 30000);
        for attempt in 1..=4 {
            let exponential = 1000u64 * (1 << (attempt - 1));
            for _ in 0..50 {
                let delay = policy.delay_for_attempt(attempt).as_millis() as u64;
                assert!(
                    delay >= exponential && delay < exponential + 1000,
                    "attempt {attempt}: delay {delay} outside [{exponential}, {})",
                    exponential + 1000
                );
            }
        }
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let policy = ReconnectPolicy::new(1000, 30000);
        // 2^14 seconds of base delay is far beyond the cap
        for _ in 0..50 {
            assert!(policy.delay_for_attempt(15).as_millis() as u64 <= 30000);
        }
    }

    #[test]
    fn test_first_attempt_starts_at_base() {
        let policy = ReconnectPolicy::new(500, 10000);
        let delay = policy.delay_for_attempt(1).as_millis() as u64;
        assert!((500..1000).contains(&delay));
    }

    #[test]
    fn test_zero_base_is_sane() {
        let policy = ReconnectPolicy::new(0, 10000);
        assert_eq!(policy.delay_for_attempt(3), Duration::ZERO);
    }
}
