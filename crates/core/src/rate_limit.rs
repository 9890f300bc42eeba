//! Request-rate parsing and a fixed-window limiter.
//!
//! Rates use the compact `"<count>/<period>"` notation, e.g. `60/m`,
//! `5/10s` or `1000/day`. Windows are aligned to multiples of the period
//! (a `60/m` window always starts on a whole minute), so every key that is
//! seen inside the same window shares the same reset time.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Once this many keys are tracked, expired windows are pruned on insert.
const PRUNE_THRESHOLD: usize = 10_000;

/// A request budget: `limit` requests per `period_secs` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub limit: u32,
    pub period_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateParseError {
    #[error("rate must look like '<count>/<period>', got '{0}'")]
    Format(String),
    #[error("invalid request count in rate '{0}'")]
    Count(String),
    #[error("unknown period unit in rate '{0}' (expected s, m, h or d)")]
    Unit(String),
}

impl FromStr for Rate {
    type Err = RateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, period) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| RateParseError::Format(s.to_string()))?;

        let limit: u32 = count
            .trim()
            .parse()
            .map_err(|_| RateParseError::Count(s.to_string()))?;

        let period = period.trim();
        let split_at = period
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| RateParseError::Unit(s.to_string()))?;
        let (multiplier, unit) = period.split_at(split_at);
        let multiplier: u64 = if multiplier.is_empty() {
            1
        } else {
            multiplier
                .parse()
                .map_err(|_| RateParseError::Format(s.to_string()))?
        };
        if multiplier == 0 {
            return Err(RateParseError::Format(s.to_string()));
        }

        // Only the first letter of the unit matters: "m", "min" and "minute" agree.
        let unit_secs = match unit.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 3_600,
            Some('d') => 86_400,
            _ => return Err(RateParseError::Unit(s.to_string())),
        };

        Ok(Rate {
            limit,
            period_secs: multiplier * unit_secs,
        })
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.limit, self.period_secs)
    }
}

/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests still available in the current window after this one.
    pub remaining: u32,
    /// Seconds until the current window resets.
    pub reset_after_secs: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: u64,
    count: u32,
}

/// Thread-safe fixed-window counter keyed by an arbitrary string
/// (user id or client address).
#[derive(Debug)]
pub struct FixedWindowLimiter {
    rate: Rate,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Record one request for `key` against the wall clock.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.check_at(key, now)
    }

    /// Record one request for `key` at `now` (seconds since the epoch).
    ///
    /// Rejected requests are not counted.
    pub fn check_at(&self, key: &str, now: u64) -> RateDecision {
        let period = self.rate.period_secs.max(1);
        let window_start = now - now % period;
        let reset_after_secs = window_start + period - now;

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() >= PRUNE_THRESHOLD && !windows.contains_key(key) {
            windows.retain(|_, w| w.start >= window_start);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            start: window_start,
            count: 0,
        });
        if window.start != window_start {
            *window = Window {
                start: window_start,
                count: 0,
            };
        }

        if window.count >= self.rate.limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_after_secs,
            };
        }

        window.count += 1;
        RateDecision {
            allowed: true,
            remaining: self.rate.limit - window.count,
            reset_after_secs,
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
