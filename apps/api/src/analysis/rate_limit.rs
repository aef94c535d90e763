//! In-memory sliding-window rate limiter, keyed by client identifier.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

pub const MAX_REQUESTS: usize = 10;
pub const WINDOW: Duration = Duration::from_secs(60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: usize,
    /// Set only when denied: time until the oldest request leaves the window.
    pub retry_after_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct RateLimitEntry {
    timestamps: VecDeque<Instant>,
}

pub struct RateLimiter {
    store: DashMap<String, RateLimitEntry>,
    max_requests: usize,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_REQUESTS, WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            store: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Admits or denies one request from `identifier`, recording it when admitted.
    ///
    /// The whole trim/count/append runs under the entry's shard lock, so concurrent
    /// checks for the same identifier are serialized.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut entry = self.store.entry(identifier.to_string()).or_default();
        let timestamps = &mut entry.timestamps;

        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            let retry_after = timestamps
                .front()
                .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
                .unwrap_or_default();
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_ms: Some(retry_after.as_millis() as u64),
            };
        }

        timestamps.push_back(now);
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - timestamps.len(),
            retry_after_ms: None,
        }
    }

    /// Drops identifiers with no requests, or whose newest request is older than two windows.
    /// Returns how many identifiers were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let stale_after = self.window * 2;
        let before = self.store.len();
        self.store.retain(|_, entry| match entry.timestamps.back() {
            Some(&newest) => now.duration_since(newest) <= stale_after,
            None => false,
        });
        before.saturating_sub(self.store.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}

/// Runs `sweep` every `interval` until the returned task is aborted.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                debug!(
                    "Rate limiter sweep removed {} stale clients ({} remaining)",
                    removed,
                    limiter.tracked_clients()
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_max_then_denies() {
        let limiter = RateLimiter::default();

        for i in 0..MAX_REQUESTS {
            let decision = limiter.check("1.2.3.4");
            assert!(decision.allowed, "request {i} should be admitted");
            assert_eq!(decision.remaining, MAX_REQUESTS - i - 1);
            assert_eq!(decision.retry_after_ms, None);
        }

        let denied = limiter.check("1.2.3.4");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.retry_after_ms.unwrap() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_tracks_oldest_request() {
        let limiter = RateLimiter::new(2, WINDOW);
        limiter.check("client");
        tokio::time::advance(Duration::from_secs(20)).await;
        limiter.check("client");

        let denied = limiter.check("client");
        assert_eq!(denied.retry_after_ms, Some(40_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::default();
        for _ in 0..MAX_REQUESTS {
            limiter.check("client");
        }
        assert!(!limiter.check("client").allowed);

        tokio::time::advance(WINDOW + Duration::from_millis(1)).await;
        let decision = limiter.check("client");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, MAX_REQUESTS - 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_requests_are_not_recorded() {
        let limiter = RateLimiter::new(1, WINDOW);
        assert!(limiter.check("client").allowed);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!limiter.check("client").allowed);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(limiter.check("client").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identifiers_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_stale_clients() {
        let limiter = RateLimiter::default();
        limiter.check("old");
        tokio::time::advance(WINDOW * 2 + Duration::from_secs(1)).await;
        limiter.check("fresh");

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.check("fresh").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_runs_on_interval() {
        let limiter = Arc::new(RateLimiter::default());
        limiter.check("one-off");
        let handle = spawn_sweeper(limiter.clone(), SWEEP_INTERVAL);

        tokio::time::sleep(SWEEP_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(limiter.tracked_clients(), 0);
        handle.abort();
    }
}
