//! Sliding-window rate limiting keyed by client.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted; `remaining` more fit in the current window.
    Allowed { remaining: u32 },
    /// Window is full; the oldest admitted request leaves it after `retry_after`.
    Limited { retry_after: Duration },
}

/// Shared store of per-key request windows.
///
/// The limit and window are supplied per check so a reloaded route table can
/// keep counting against the same store.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &str, max: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, max, window, Instant::now())
    }

    /// Admit or refuse a request for `key` observed at `now`.
    ///
    /// Refused requests are not recorded.
    pub fn check_at(&self, key: &str, max: u32, window: Duration, now: Instant) -> RateLimitDecision {
        let mut hits = self.windows.entry(key.to_string()).or_default();
        evict(&mut hits, window, now);

        if (hits.len() as u64) < u64::from(max) {
            hits.push_back(now);
            let remaining = max.saturating_sub(hits.len() as u32);
            RateLimitDecision::Allowed { remaining }
        } else {
            let retry_after = hits
                .front()
                .map(|oldest| (*oldest + window).saturating_duration_since(now))
                .unwrap_or(window);
            RateLimitDecision::Limited { retry_after }
        }
    }

    /// Drop keys whose windows no longer hold any hits.
    pub fn sweep(&self, window: Duration) {
        let now = Instant::now();
        self.windows.retain(|_, hits| {
            evict(hits, window, now);
            !hits.is_empty()
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

fn evict(hits: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    while let Some(oldest) = hits.front() {
        if now.saturating_duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_seventh_request_in_window_is_limited() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..6u32 {
            let at = start + Duration::from_secs(u64::from(i));
            assert_eq!(
                limiter.check_at("user:1", 6, MINUTE, at),
                RateLimitDecision::Allowed { remaining: 5 - i }
            );
        }

        match limiter.check_at("user:1", 6, MINUTE, start + Duration::from_secs(10)) {
            RateLimitDecision::Limited { retry_after } => assert_eq!(retry_after, Duration::from_secs(50)),
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..6u64 {
            limiter.check_at("k", 6, MINUTE, start + Duration::from_secs(i * 10));
        }
        // The first hit (t=0) leaves the window at t=60, freeing one slot.
        assert!(matches!(
            limiter.check_at("k", 6, MINUTE, start + Duration::from_secs(59)),
            RateLimitDecision::Limited { .. }
        ));
        assert_eq!(
            limiter.check_at("k", 6, MINUTE, start + Duration::from_secs(60)),
            RateLimitDecision::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.check_at("k", 6, MINUTE, start + Duration::from_secs(61)),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", 1, MINUTE, now), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", 1, MINUTE, now), RateLimitDecision::Limited { .. }));
        assert!(matches!(limiter.check_at("b", 1, MINUTE, now), RateLimitDecision::Allowed { .. }));
    }

    #[test]
    fn test_sweep_drops_idle_keys() {
        let limiter = RateLimiter::new();
        limiter.check_at("old", 6, MINUTE, Instant::now());
        limiter.sweep(Duration::ZERO);
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
