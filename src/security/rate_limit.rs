//! Fixed-window rate limiting per client address.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::clock::Clock;
use crate::observability::metrics;

/// Length of one rate window in milliseconds.
pub const RATE_WINDOW_MILLIS: u64 = 60_000;

/// Counter for a single client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCounter {
    pub window_start_millis: u64,
    pub count: u32,
}

impl RateCounter {
    fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.window_start_millis) > RATE_WINDOW_MILLIS
    }
}

/// Fixed-window request counter keyed by client address.
///
/// Bursts straddling a window boundary can reach twice the budget; that is
/// the accepted cost of a fixed window.
pub struct RateLimiter {
    counters: DashMap<String, RateCounter>,
    max_per_window: u32,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            max_per_window,
            clock,
        }
    }

    /// Count one request for `client_key` and report whether it is over budget.
    ///
    /// `client_key` must already have its port suffix stripped. The map entry
    /// stays locked for the whole read-modify-write, so concurrent callers on
    /// the same key never lose an increment.
    pub fn check(&self, client_key: &str) -> bool {
        let now = self.clock.now_millis();

        let mut counter = self
            .counters
            .entry(client_key.to_string())
            .or_insert_with(|| RateCounter {
                window_start_millis: now,
                count: 0,
            });

        if counter.is_expired(now) {
            counter.window_start_millis = now;
            counter.count = 0;
        }
        counter.count = counter.count.saturating_add(1);

        counter.count > self.max_per_window
    }

    /// Drop counters whose window has already run out.
    ///
    /// A dropped key behaves exactly like an expired one on its next request.
    pub fn evict_stale(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.counters.len();
        self.counters.retain(|_, counter| !counter.is_expired(now));
        before.saturating_sub(self.counters.len())
    }

    /// Number of client keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }

    pub fn counter(&self, client_key: &str) -> Option<RateCounter> {
        self.counters.get(client_key).map(|c| *c)
    }
}

/// Periodically evicts expired counters so the map stays bounded.
pub struct RateLimitSweeper {
    limiter: Arc<RateLimiter>,
    period: Duration,
}

impl RateLimitSweeper {
    pub fn new(limiter: Arc<RateLimiter>, period: Duration) -> Self {
        Self { limiter, period }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.period);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.limiter.evict_stale();
                    let tracked = self.limiter.tracked_keys();
                    metrics::set_tracked_clients(tracked);
                    if evicted > 0 {
                        tracing::debug!(evicted, tracked, "Evicted stale rate counters");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
