//! Geolocation Lookup Module
//!
//! Defines the lookup seam and its reqwest-backed implementation.
//! One attempt per cache miss, no retry.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::geo::GeoResponse;

// == Lookup Trait ==
/// Seam for the external geolocation endpoint, mockable in tests.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Performs a single lookup of the current visitor's IP and location.
    async fn fetch(&self) -> Result<GeoResponse>;
}

// == HTTP Implementation ==
/// Unauthenticated GET against a JSON geolocation endpoint.
pub struct HttpGeoLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGeoLookup {
    /// Creates a lookup against the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn fetch(&self) -> Result<GeoResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| PipelineError::Lookup(e.to_string()))?
            .error_for_status()
            .map_err(|e| PipelineError::Lookup(e.to_string()))?;

        response
            .json::<GeoResponse>()
            .await
            .map_err(|e| PipelineError::Lookup(format!("invalid response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_lookup_construction() {
        let lookup = HttpGeoLookup::new("https://ipapi.co/json/");
        assert_eq!(lookup.endpoint, "https://ipapi.co/json/");
    }
}
