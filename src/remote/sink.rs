//! Remote Sink Module
//!
//! Boundary contract for the hosted backend-as-a-service: row insert and a
//! lightweight read probe. Failures are error values, never panics.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// == Sink Trait ==
/// Opaque remote data sink consumed by the pipeline and the form flows.
#[async_trait]
pub trait RemoteSink: Send + Sync {
    /// Inserts rows into the named table.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<()>;

    /// Read-only existence probe; returns the table's row count.
    async fn select_count(&self, table: &str) -> Result<u64>;
}

/// Shared handle to a sink implementation.
pub type SharedSink = Arc<dyn RemoteSink>;
