//! Clock Module
//!
//! Timestamp helpers shared by the cache, the rate limiter and the gates.
//! All internal bookkeeping uses Unix milliseconds; transmitted records carry
//! ISO-8601 strings.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

/// Returns the current time as an ISO-8601 / RFC 3339 string.
pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_recent() {
        // Sanity bound: after 2020-01-01 in milliseconds.
        assert!(current_timestamp_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_timestamp_monotonic_enough() {
        let a = current_timestamp_ms();
        let b = current_timestamp_ms();
        assert!(b >= a);
    }

    #[test]
    fn test_iso_timestamp_shape() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.starts_with("20"));
    }
}
