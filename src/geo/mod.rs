//! Geolocation Module
//!
//! IP/location resolution through a time- and size-bounded cache.

mod cache;
mod location;
mod lookup;

// Re-export public types
pub use cache::{CacheEntry, CacheEntrySnapshot, IpCache, IpCacheSnapshot, IpCacheStats, CURRENT_IP_KEY};
pub use location::{GeoResponse, LocationRecord, UNKNOWN};
pub use lookup::{GeoLookup, HttpGeoLookup};
