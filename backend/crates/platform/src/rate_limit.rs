//! Rate Limiting Infrastructure
//!
//! Fixed-window request counting per client key. Windows are aligned to
//! multiples of the window length, so every key resets at the same instant.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    /// 100 requests per 15 minutes
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        (self.window.as_millis() as i64).max(1)
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Whole seconds until the window resets, at least 1
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let wait_ms = (self.reset_at_ms - now_ms).max(0) as u64;
        wait_ms.div_ceil(1000).max(1)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start_ms: i64,
    count: u32,
}

/// Process-local fixed-window limiter keyed by client identity
#[derive(Debug, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request for `key` and report whether it may proceed
    ///
    /// Rejected requests still count, so a client hammering past the limit
    /// does not get a fresh budget until the window rolls over.
    pub fn check_and_increment(&self, key: &str, now_ms: i64) -> RateLimitResult {
        let window_ms = self.config.window_ms();
        let window_start = now_ms.div_euclid(window_ms) * window_ms;

        let mut windows = self.windows.lock();
        let window = windows.entry(key.to_string()).or_insert(Window {
            start_ms: window_start,
            count: 0,
        });
        if window.start_ms != window_start {
            *window = Window {
                start_ms: window_start,
                count: 0,
            };
        }
        window.count = window.count.saturating_add(1);

        RateLimitResult {
            allowed: window.count <= self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_at_ms: window_start + window_ms,
        }
    }

    /// Drop windows that ended before `now_ms`; returns how many were removed
    pub fn prune(&self, now_ms: i64) -> usize {
        let window_ms = self.config.window_ms();
        let current_start = now_ms.div_euclid(window_ms) * window_ms;

        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, window| window.start_ms >= current_start);
        before - windows.len()
    }
}
