//! HTTP Sink Module
//!
//! reqwest client speaking the PostgREST convention used by hosted
//! backend-as-a-service platforms: `POST /rest/v1/{table}` for inserts and a
//! `HEAD` request with `Prefer: count=exact` as the read probe.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::remote::RemoteSink;

// == HTTP Sink ==
/// PostgREST-style remote sink.
pub struct HttpSink {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSink {
    /// Creates a sink from the two connection secrets.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PipelineError::Sink(format!("client construction failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Extracts the total count from a `Content-Range` header value such as
/// `0-24/3573` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    let total = value.rsplit('/').next()?;
    if total == "*" {
        return Some(0);
    }
    total.parse().ok()
}

#[async_trait]
impl RemoteSink for HttpSink {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<()> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|e| PipelineError::Sink(format!("insert into {table} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Sink(format!(
                "insert into {table} rejected: {status} {body}"
            )));
        }
        Ok(())
    }

    async fn select_count(&self, table: &str) -> Result<u64> {
        let response = self
            .authed(self.client.head(self.table_url(table)))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| PipelineError::Sink(format!("probe of {table} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Sink(format!(
                "probe of {table} rejected: {status}"
            )));
        }

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                PipelineError::Sink(format!("probe of {table} returned no usable count"))
            })
    }
}
