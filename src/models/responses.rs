//! Response DTOs for the diagnostic API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::geo::{IpCacheSnapshot, IpCacheStats};
use crate::limiter::RateLimitSnapshot;
use crate::pipeline::LogOutcome;

/// Response body for the manual log trigger (POST /log)
#[derive(Debug, Clone, Serialize)]
pub struct LogResponse {
    /// What the attempt resolved to
    pub outcome: LogOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_views: Option<u64>,
}

impl LogResponse {
    /// Creates a response from the attempt outcome and session info.
    pub fn new(outcome: LogOutcome, session: Option<(String, u64)>) -> Self {
        let (session_id, page_views) = match session {
            Some((id, views)) => (Some(id), Some(views)),
            None => (None, None),
        };
        Self {
            outcome,
            session_id,
            page_views,
        }
    }
}

/// Response body for cache statistics (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub average_age_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub fallbacks: u64,
    pub evictions: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl CacheStatsResponse {
    /// Assembles the stats view from counters and the age breakdown.
    pub fn new(stats: IpCacheStats, valid: usize, expired: usize, average_age_secs: u64) -> Self {
        let requests = stats.hits + stats.misses;
        let hit_rate = if requests > 0 {
            stats.hits as f64 / requests as f64
        } else {
            0.0
        };
        Self {
            total_entries: valid + expired,
            valid_entries: valid,
            expired_entries: expired,
            average_age_secs,
            hits: stats.hits,
            misses: stats.misses,
            fallbacks: stats.fallbacks,
            evictions: stats.evictions,
            hit_rate,
        }
    }
}

/// Response body for clear operations (DELETE /cache, DELETE /limits)
#[derive(Debug, Clone, Serialize)]
pub struct ClearedResponse {
    pub message: String,
    pub removed: usize,
}

impl ClearedResponse {
    pub fn new(what: &str, removed: usize) -> Self {
        Self {
            message: format!("{what} cleared ({removed} entries removed)"),
            removed,
        }
    }
}

/// Response body for window reconfiguration (PUT /limits)
#[derive(Debug, Clone, Serialize)]
pub struct WindowResponse {
    pub message: String,
    pub window_secs: u64,
}

impl WindowResponse {
    pub fn new(window_secs: u64) -> Self {
        Self {
            message: format!("Rate limit window set to {window_secs}s"),
            window_secs,
        }
    }
}

/// Response body for form submissions (POST /forms/*)
#[derive(Debug, Clone, Serialize)]
pub struct FormResponse {
    pub message: String,
}

impl FormResponse {
    pub fn submitted() -> Self {
        Self {
            message: "Thank You!".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g. "healthy")
    pub status: String,
    /// Whether the remote sink has announced readiness
    pub remote_ready: bool,
    /// Current timestamp in ISO-8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(remote_ready: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            remote_ready,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// Snapshot types are serialized as-is.
pub type CacheResponse = IpCacheSnapshot;
pub type LimitsResponse = RateLimitSnapshot;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_response_serializes_outcome() {
        let resp = LogResponse::new(LogOutcome::RateLimited, None);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("rate_limited"));
        assert!(!json.contains("session_id"));
    }

    #[test]
    fn test_log_response_with_session() {
        let resp = LogResponse::new(LogOutcome::Logged, Some(("session_abc".to_string(), 3)));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["session_id"], "session_abc");
        assert_eq!(json["page_views"], 3);
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = IpCacheStats {
            hits: 8,
            misses: 2,
            fallbacks: 1,
            evictions: 0,
        };
        let resp = CacheStatsResponse::new(stats, 3, 1, 42);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.total_entries, 4);
    }

    #[test]
    fn test_cache_stats_zero_requests() {
        let resp = CacheStatsResponse::new(IpCacheStats::default(), 0, 0, 0);
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_cleared_response_message() {
        let resp = ClearedResponse::new("IP cache", 7);
        assert!(resp.message.contains("IP cache"));
        assert!(resp.message.contains('7'));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(true);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("remote_ready"));
    }
}
