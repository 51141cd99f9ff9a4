//! Configuration Module
//!
//! Handles loading and managing pipeline configuration from environment variables.
//!
//! The two remote connection secrets (`REMOTE_URL`, `REMOTE_API_KEY`) are the only
//! values without defaults. Their absence is a startup warning, not a hard failure:
//! the pipeline still runs with remote features disabled.

use std::env;

/// Pipeline configuration parameters.
///
/// All values except the connection secrets have sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote data sink (e.g. a hosted PostgREST endpoint)
    pub remote_url: Option<String>,
    /// Access key for the remote data sink
    pub remote_api_key: Option<String>,
    /// Geolocation endpoint returning `{ip, country_name, city, region}` JSON
    pub geo_endpoint: String,
    /// Remote table receiving visitor log records
    pub log_table: String,
    /// Remote table receiving mailing-list signups
    pub mailing_table: String,
    /// Remote table receiving contact messages
    pub contact_table: String,
    /// Maximum number of entries the IP cache can hold
    pub ip_cache_max: usize,
    /// IP cache entry validity in seconds
    pub ip_cache_ttl_secs: u64,
    /// Maximum number of entries the rate-limit table can hold
    pub rate_limit_max: usize,
    /// Per-IP rate-limit window in seconds
    pub rate_limit_window_secs: u64,
    /// Remote client construction retry interval in milliseconds
    pub init_retry_ms: u64,
    /// Delay before the fallback initial-visit trigger fires, in milliseconds
    pub fallback_delay_ms: u64,
    /// Minimum gap between visibility-triggered logs, in seconds
    pub visibility_gate_secs: u64,
    /// Minimum gap before the shutdown-triggered log, in seconds
    pub unload_gate_secs: u64,
    /// Form resubmission cooldown in seconds
    pub form_cooldown_secs: u64,
    /// Diagnostic HTTP API port
    pub server_port: u16,
    /// Transmit extended fields (session id, page views, screen, viewport,
    /// referrer) in addition to the base visitor record
    pub extended_schema: bool,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REMOTE_URL` / `REMOTE_API_KEY` - sink connection secrets (no default)
    /// - `GEO_ENDPOINT` - geolocation endpoint (default: https://ipapi.co/json/)
    /// - `LOG_TABLE` / `MAILING_TABLE` / `CONTACT_TABLE` - remote table names
    /// - `IP_CACHE_MAX` (100), `IP_CACHE_TTL` (300s)
    /// - `RATE_LIMIT_MAX` (1000), `RATE_LIMIT_WINDOW` (30s)
    /// - `INIT_RETRY_MS` (100), `FALLBACK_DELAY_MS` (2000)
    /// - `VISIBILITY_GATE` (300s), `UNLOAD_GATE` (60s)
    /// - `FORM_COOLDOWN` (5s), `SERVER_PORT` (3000)
    /// - `EXTENDED_SCHEMA` (false)
    pub fn from_env() -> Self {
        Self {
            remote_url: env::var("REMOTE_URL").ok().filter(|v| !v.is_empty()),
            remote_api_key: env::var("REMOTE_API_KEY").ok().filter(|v| !v.is_empty()),
            geo_endpoint: env_string("GEO_ENDPOINT", "https://ipapi.co/json/"),
            log_table: env_string("LOG_TABLE", "visitor_logs"),
            mailing_table: env_string("MAILING_TABLE", "mailing_list"),
            contact_table: env_string("CONTACT_TABLE", "contact_messages"),
            ip_cache_max: env_parse("IP_CACHE_MAX", 100),
            ip_cache_ttl_secs: env_parse("IP_CACHE_TTL", 300),
            rate_limit_max: env_parse("RATE_LIMIT_MAX", 1000),
            rate_limit_window_secs: env_parse("RATE_LIMIT_WINDOW", 30),
            init_retry_ms: env_parse("INIT_RETRY_MS", 100),
            fallback_delay_ms: env_parse("FALLBACK_DELAY_MS", 2000),
            visibility_gate_secs: env_parse("VISIBILITY_GATE", 300),
            unload_gate_secs: env_parse("UNLOAD_GATE", 60),
            form_cooldown_secs: env_parse("FORM_COOLDOWN", 5),
            server_port: env_parse("SERVER_PORT", 3000),
            extended_schema: env_parse("EXTENDED_SCHEMA", false),
        }
    }

    /// Returns true if both remote connection secrets are present.
    pub fn remote_configured(&self) -> bool {
        self.remote_url.is_some() && self.remote_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_api_key: None,
            geo_endpoint: "https://ipapi.co/json/".to_string(),
            log_table: "visitor_logs".to_string(),
            mailing_table: "mailing_list".to_string(),
            contact_table: "contact_messages".to_string(),
            ip_cache_max: 100,
            ip_cache_ttl_secs: 300,
            rate_limit_max: 1000,
            rate_limit_window_secs: 30,
            init_retry_ms: 100,
            fallback_delay_ms: 2000,
            visibility_gate_secs: 300,
            unload_gate_secs: 60,
            form_cooldown_secs: 5,
            server_port: 3000,
            extended_schema: false,
        }
    }
}
