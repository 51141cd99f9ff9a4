//! Rate Limiter Module
//!
//! Per-IP suppression of repeated log attempts within a fixed window.
//!
//! Independent of the IP cache: an IP can be cache-hit yet rate-limited, and
//! vice versa. Unknown or empty IPs are never limited since they cannot be
//! tracked meaningfully.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::clock::current_timestamp_ms;
use crate::geo::UNKNOWN;

// == Snapshot Types ==
/// Point-in-time view of one tracked IP.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitEntrySnapshot {
    pub ip: String,
    /// Seconds until the window elapses; 0 when already expired
    pub remaining_secs: u64,
    pub active: bool,
}

/// Point-in-time view of the rate-limit table.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitSnapshot {
    pub window_secs: u64,
    pub size: usize,
    pub entries: Vec<RateLimitEntrySnapshot>,
}

// == Rate Limit Table ==
/// Maps IP to the instant of its last accepted log.
#[derive(Debug)]
pub struct RateLimitTable {
    entries: HashMap<String, u64>,
    max_entries: usize,
    window_ms: u64,
}

impl RateLimitTable {
    /// Creates a table holding at most `max_entries` IPs with the given window.
    pub fn new(max_entries: usize, window_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            window_ms: window_secs * 1000,
        }
    }

    // == Is Limited ==
    /// Returns true if the IP produced an accepted log within the window.
    pub fn is_limited(&self, ip: &str) -> bool {
        self.is_limited_at(ip, current_timestamp_ms())
    }

    /// Window check against an explicit clock reading.
    pub fn is_limited_at(&self, ip: &str, now: u64) -> bool {
        if ip.is_empty() || ip == UNKNOWN {
            return false;
        }

        match self.entries.get(ip) {
            Some(&last) if now.saturating_sub(last) < self.window_ms => {
                let remaining = (self.window_ms - now.saturating_sub(last)).div_ceil(1000);
                debug!(ip, remaining_secs = remaining, "IP is rate limited");
                true
            }
            _ => false,
        }
    }

    // == Mark Logged ==
    /// Records now as the IP's last accepted log.
    pub fn mark_logged(&mut self, ip: &str) {
        self.mark_logged_at(ip, current_timestamp_ms());
    }

    /// Records an explicit clock reading, then evicts synchronously if the
    /// cap was exceeded.
    pub fn mark_logged_at(&mut self, ip: &str, now: u64) {
        if ip.is_empty() || ip == UNKNOWN {
            return;
        }
        self.entries.insert(ip.to_string(), now);
        self.evict_if_over();
    }

    /// When the entry count exceeds the cap, removes the oldest half
    /// (by ascending timestamp).
    fn evict_if_over(&mut self) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        let mut by_age: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|(ip, timestamp)| (ip.clone(), *timestamp))
            .collect();
        by_age.sort_by_key(|(_, timestamp)| *timestamp);

        let to_remove = self.max_entries / 2;
        for (ip, _) in by_age.into_iter().take(to_remove) {
            self.entries.remove(&ip);
        }
        info!(removed = to_remove, "cleaned up old rate limit entries");
    }

    // == Window Reconfiguration ==
    /// Changes the window duration at runtime.
    pub fn set_window_secs(&mut self, secs: u64) {
        let old = self.window_ms / 1000;
        self.window_ms = secs * 1000;
        info!(old_secs = old, new_secs = secs, "rate limit window changed");
    }

    /// Current window duration in seconds.
    pub fn window_secs(&self) -> u64 {
        self.window_ms / 1000
    }

    // == Diagnostics ==
    /// Removes every entry; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let size = self.entries.len();
        self.entries.clear();
        size
    }

    /// Returns a point-in-time view with remaining window per IP.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        let now = current_timestamp_ms();
        let mut entries: Vec<RateLimitEntrySnapshot> = self
            .entries
            .iter()
            .map(|(ip, &last)| {
                let elapsed = now.saturating_sub(last);
                let active = elapsed < self.window_ms;
                RateLimitEntrySnapshot {
                    ip: ip.clone(),
                    remaining_secs: self.window_ms.saturating_sub(elapsed).div_ceil(1000),
                    active,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.ip.cmp(&b.ip));

        RateLimitSnapshot {
            window_secs: self.window_ms / 1000,
            size: self.entries.len(),
            entries,
        }
    }

    /// Current number of tracked IPs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no IPs are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
