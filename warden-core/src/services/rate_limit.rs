//! Fixed-window request throttling.
//!
//! Counts requests per key in discrete, non-overlapping windows. Purely
//! process-local and synchronous: state lives in a concurrent map, resets on
//! restart, and is never persisted. A multi-instance deployment would swap
//! this for a shared store with atomic increment-with-TTL behind the same
//! `check` signature.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Per-key fixed-window counter.
///
/// One instance is shared per process and injected where needed; tests
/// construct a fresh instance per case.
pub struct FixedWindowLimiter {
    interval: Duration,
    max_keys: usize,
    windows: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            interval: config.interval,
            max_keys: config.max_keys,
            windows: DashMap::new(),
        }
    }

    /// Count one request against `key`. Returns `true` while the key is
    /// within `limit` for the current window; a denied call does not mutate
    /// the window.
    ///
    /// When the number of distinct tracked keys exceeds the configured cap,
    /// the entire map is cleared before this call is processed. That trades
    /// accuracy under attack-scale key cardinality for bounded memory; the
    /// forgiven windows are an accepted approximation.
    pub fn check(&self, limit: u32, key: &str) -> bool {
        if self.windows.len() > self.max_keys {
            tracing::warn!(
                tracked = self.windows.len(),
                cap = self.max_keys,
                "Rate limiter key cap exceeded, clearing all windows"
            );
            self.windows.clear();
        }

        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) > self.interval {
            entry.count = 1;
            entry.started = now;
            return true;
        }

        if entry.count < limit {
            entry.count += 1;
            return true;
        }

        false
    }

    /// Time until the key's current window rolls over. `None` when the key is
    /// untracked or its window has already elapsed.
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let window = self.windows.get(key)?;
        self.interval.checked_sub(window.started.elapsed())
    }
}
