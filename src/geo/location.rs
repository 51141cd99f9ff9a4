//! Location Record Module
//!
//! Defines the resolved visitor location and the wire format of the external
//! geolocation endpoint.

use serde::{Deserialize, Serialize};

/// Sentinel value for any field the lookup could not resolve.
pub const UNKNOWN: &str = "unknown";

// == Location Record ==
/// Resolved IP and location data for the current visitor.
///
/// Every field defaults to `"unknown"` on partial or total lookup failure;
/// the record is always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRecord {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
}

impl LocationRecord {
    /// Returns a record with every field set to `"unknown"`.
    pub fn unknown() -> Self {
        Self {
            ip: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
        }
    }

    /// Returns true if the IP could not be resolved.
    pub fn ip_unknown(&self) -> bool {
        self.ip == UNKNOWN
    }
}

// == Geolocation Wire Format ==
/// Raw JSON body returned by the geolocation endpoint.
///
/// All fields are optional; missing ones become `"unknown"` in the
/// resulting [`LocationRecord`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoResponse {
    pub ip: Option<String>,
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

impl From<GeoResponse> for LocationRecord {
    fn from(resp: GeoResponse) -> Self {
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            ip: or_unknown(resp.ip),
            country: or_unknown(resp.country_name),
            city: or_unknown(resp.city),
            region: or_unknown(resp.region),
        }
    }
}
