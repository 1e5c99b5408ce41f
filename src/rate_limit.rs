use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::debug;

use crate::metrics::RATE_LIMIT_ENTRIES;

/// Rate limit entry - tracks requests per client identifier.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Rejected,
}

/// Fixed-window request counter keyed by client identifier.
///
/// Process-local: with several instances behind a load balancer each one
/// enforces `limit` on its own.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn check_and_consume(&self, client_id: &str) -> Decision {
        self.check_at(client_id, Instant::now())
    }

    /// The shard lock taken by `entry` is held for the whole
    /// read-modify-write, so two requests for the same key never both pass
    /// the `count < limit` test.
    pub fn check_at(&self, client_id: &str, now: Instant) -> Decision {
        let mut entry = self
            .entries
            .entry(client_id.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_time: now + self.window,
            });

        // window elapsed..? start a new one
        if now >= entry.reset_time {
            entry.count = 1;
            entry.reset_time = now + self.window;
            return Decision::Allowed;
        }

        if entry.count >= self.limit {
            return Decision::Rejected;
        }

        entry.count += 1;
        Decision::Allowed
    }

    /// Drops every entry whose window has already ended.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_time > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, client_id: &str) -> Option<RateLimitEntry> {
        self.entries.get(client_id).map(|entry| *entry)
    }
}

/// Sweeper - runs every `every` for the lifetime of the process.
pub async fn sweeper(rate_limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every);

    debug!(?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = rate_limiter.sweep_at(Instant::now());
        RATE_LIMIT_ENTRIES.set(rate_limiter.len() as f64);

        if removed > 0 {
            debug!(removed, remaining = rate_limiter.len(), "swept rate limit entries");
        }
    }
}
