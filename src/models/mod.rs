//! Request and Response models for the diagnostic API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{LogTriggerRequest, SetWindowRequest};
pub use responses::{
    CacheResponse, CacheStatsResponse, ClearedResponse, FormResponse, HealthResponse,
    LimitsResponse, LogResponse, WindowResponse,
};
