//! Error types for the visitor logging pipeline
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Pipeline Error Enum ==
/// Unified error type for the pipeline and its diagnostic API.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required configuration value is missing
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// The geolocation endpoint could not be reached or parsed
    #[error("Geolocation lookup failed: {0}")]
    Lookup(String),

    /// The remote data sink rejected or failed an operation
    #[error("Remote sink error: {0}")]
    Sink(String),

    /// The remote sink has not finished initializing
    #[error("Remote sink not ready")]
    RemoteUnavailable,

    /// A form field failed validation
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// A form was resubmitted before its cooldown elapsed
    #[error("Please wait {remaining_secs}s before submitting again")]
    Cooldown { remaining_secs: u64 },

    /// Invalid request data on the diagnostic API
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::MissingConfig(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Lookup(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Sink(_) => StatusCode::BAD_GATEWAY,
            PipelineError::RemoteUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Validation { .. } => StatusCode::BAD_REQUEST,
            PipelineError::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;
