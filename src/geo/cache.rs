//! IP Cache Module
//!
//! Time- and size-bounded cache in front of the geolocation endpoint.
//!
//! The primary hit path is the `"current_ip"` key; successful lookups are also
//! stored under the literal IP. When the entry count exceeds the cap, the oldest
//! half of the entries (by timestamp) is evicted synchronously.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::current_timestamp_ms;
use crate::geo::{GeoLookup, LocationRecord};

/// Key under which the most recent lookup for this process is stored.
pub const CURRENT_IP_KEY: &str = "current_ip";

// == Cache Entry ==
/// A single cached lookup result. Immutable once created; replaced, never mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The resolved location data
    pub data: LocationRecord,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl CacheEntry {
    /// Creates an entry timestamped now.
    pub fn new(data: LocationRecord) -> Self {
        Self {
            data,
            timestamp: current_timestamp_ms(),
        }
    }

    /// Creates an entry with an explicit timestamp.
    pub fn with_timestamp(data: LocationRecord, timestamp: u64) -> Self {
        Self { data, timestamp }
    }

    /// Entry age in milliseconds at `now`.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    /// Validity is a pure function of age, recomputed on every read.
    pub fn is_valid(&self, now: u64, ttl_ms: u64) -> bool {
        self.age_ms(now) < ttl_ms
    }
}

// == Cache Stats ==
/// Counters for cache behavior, exposed on the diagnostic API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IpCacheStats {
    /// Reads served from a valid cached entry
    pub hits: u64,
    /// Reads that required a network lookup
    pub misses: u64,
    /// Lookup failures recovered via stale or sentinel data
    pub fallbacks: u64,
    /// Entries removed by size-bound eviction
    pub evictions: u64,
}

// == Snapshot Types ==
/// Point-in-time view of one cache entry.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntrySnapshot {
    pub key: String,
    pub data: LocationRecord,
    pub age_secs: u64,
    pub valid: bool,
}

/// Point-in-time view of the whole cache.
#[derive(Debug, Clone, Serialize)]
pub struct IpCacheSnapshot {
    pub size: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub entries: Vec<CacheEntrySnapshot>,
}

// == IP Cache ==
/// Bounded TTL cache for geolocation lookups.
#[derive(Debug)]
pub struct IpCache {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
    ttl_ms: u64,
    stats: IpCacheStats,
}

impl IpCache {
    /// Creates a cache holding at most `max_entries`, each valid for `ttl_secs`.
    pub fn new(max_entries: usize, ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            ttl_ms: ttl_secs * 1000,
            stats: IpCacheStats::default(),
        }
    }

    // == Resolve ==
    /// Resolves the current visitor's location, consulting the cache first.
    ///
    /// Lookup failures are absorbed: the most recent `"current_ip"` entry is
    /// returned even when expired, and an all-`"unknown"` record when no entry
    /// exists at all. This function never fails outward.
    pub async fn resolve(&mut self, lookup: &dyn GeoLookup) -> LocationRecord {
        let now = current_timestamp_ms();

        if let Some(entry) = self.entries.get(CURRENT_IP_KEY) {
            if entry.is_valid(now, self.ttl_ms) {
                debug!(ip = %entry.data.ip, "using cached IP data");
                self.stats.hits += 1;
                return entry.data.clone();
            }
        }

        debug!("fetching new IP and location data");
        match lookup.fetch().await {
            Ok(resp) => {
                let record = LocationRecord::from(resp);
                self.stats.misses += 1;

                self.insert(CURRENT_IP_KEY, CacheEntry::new(record.clone()));
                if !record.ip_unknown() {
                    self.insert(record.ip.clone(), CacheEntry::new(record.clone()));
                }

                info!(ip = %record.ip, country = %record.country, "location data retrieved and cached");
                record
            }
            Err(err) => {
                warn!(%err, "could not retrieve location data");
                self.stats.fallbacks += 1;

                if let Some(entry) = self.entries.get(CURRENT_IP_KEY) {
                    warn!(ip = %entry.data.ip, "using expired cached data as fallback");
                    return entry.data.clone();
                }
                LocationRecord::unknown()
            }
        }
    }

    // == Insert ==
    /// Stores an entry, then evicts synchronously if the cap was exceeded.
    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
        self.evict_if_over();
    }

    /// When the entry count exceeds the cap, removes the oldest half
    /// (by ascending timestamp, rounding down).
    fn evict_if_over(&mut self) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        let mut by_age: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.timestamp))
            .collect();
        by_age.sort_by_key(|(_, timestamp)| *timestamp);

        let to_remove = self.max_entries / 2;
        for (key, _) in by_age.into_iter().take(to_remove) {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
        info!(removed = to_remove, "cleaned up old cache entries");
    }

    // == Diagnostics ==
    /// Removes every entry; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let size = self.entries.len();
        self.entries.clear();
        size
    }

    /// Forces the next resolve to hit the network.
    pub fn invalidate_current(&mut self) {
        self.entries.remove(CURRENT_IP_KEY);
    }

    /// Returns a point-in-time view of every entry with age and validity.
    pub fn snapshot(&self) -> IpCacheSnapshot {
        let now = current_timestamp_ms();
        let mut entries: Vec<CacheEntrySnapshot> = self
            .entries
            .iter()
            .map(|(key, entry)| CacheEntrySnapshot {
                key: key.clone(),
                data: entry.data.clone(),
                age_secs: entry.age_ms(now) / 1000,
                valid: entry.is_valid(now, self.ttl_ms),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        IpCacheSnapshot {
            size: self.entries.len(),
            max_entries: self.max_entries,
            ttl_secs: self.ttl_ms / 1000,
            entries,
        }
    }

    /// Returns behavior counters plus valid/expired breakdown and average age.
    pub fn stats(&self) -> IpCacheStats {
        self.stats.clone()
    }

    /// Number of valid and expired entries and the average entry age in seconds.
    pub fn age_breakdown(&self) -> (usize, usize, u64) {
        let now = current_timestamp_ms();
        let mut valid = 0;
        let mut expired = 0;
        let mut total_age_ms: u64 = 0;

        for entry in self.entries.values() {
            if entry.is_valid(now, self.ttl_ms) {
                valid += 1;
            } else {
                expired += 1;
            }
            total_age_ms += entry.age_ms(now);
        }

        let avg_age_secs = if self.entries.is_empty() {
            0
        } else {
            total_age_ms / self.entries.len() as u64 / 1000
        };
        (valid, expired, avg_age_secs)
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
