//! API Handlers
//!
//! HTTP request handlers for the diagnostic surface: cache and rate-limit
//! inspection, manual log triggers, and the two form flows.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::forms::{submit_contact, submit_signup, ContactInput, SignupInput, SubmissionGate};
use crate::models::{
    CacheResponse, CacheStatsResponse, ClearedResponse, FormResponse, HealthResponse,
    LimitsResponse, LogResponse, LogTriggerRequest, SetWindowRequest, WindowResponse,
};
use crate::pipeline::{Trigger, VisitorPipeline};
use crate::remote::{ReadyReceiver, SharedSink};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator owning cache, rate limits and session
    pub pipeline: Arc<VisitorPipeline>,
    /// Readiness signal; also yields the sink handle for form flows
    pub remote: ReadyReceiver,
    /// Mailing-list resubmission gate
    pub mailing_gate: Arc<SubmissionGate>,
    /// Contact form resubmission gate, independent of the mailing gate
    pub contact_gate: Arc<SubmissionGate>,
    pub mailing_table: String,
    pub contact_table: String,
}

impl AppState {
    /// Creates the state from the pipeline, the readiness receiver and config.
    pub fn new(pipeline: Arc<VisitorPipeline>, remote: ReadyReceiver, config: &Config) -> Self {
        Self {
            pipeline,
            remote,
            mailing_gate: Arc::new(SubmissionGate::new(config.form_cooldown_secs)),
            contact_gate: Arc::new(SubmissionGate::new(config.form_cooldown_secs)),
            mailing_table: config.mailing_table.clone(),
            contact_table: config.contact_table.clone(),
        }
    }

    fn sink(&self) -> Result<SharedSink> {
        self.remote
            .borrow()
            .clone()
            .ok_or(PipelineError::RemoteUnavailable)
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.pipeline.remote_ready()))
}

/// Handler for POST /log
///
/// Manual trigger into the orchestrator. The outcome is reported as data,
/// never as an HTTP error; only an unknown trigger name is a request error.
pub async fn log_handler(
    State(state): State<AppState>,
    Json(req): Json<LogTriggerRequest>,
) -> Result<Json<LogResponse>> {
    let (trigger, ctx) = req.into_parts();
    let trigger: Trigger = trigger.parse()?;

    let outcome = state.pipeline.log_visitor(trigger, ctx).await;
    let session = state.pipeline.session_info().await;

    Ok(Json(LogResponse::new(outcome, session)))
}

/// Handler for GET /cache
pub async fn cache_handler(State(state): State<AppState>) -> Json<CacheResponse> {
    Json(state.pipeline.cache_snapshot().await)
}

/// Handler for DELETE /cache
pub async fn cache_clear_handler(State(state): State<AppState>) -> Json<ClearedResponse> {
    let removed = state.pipeline.clear_cache().await;
    Json(ClearedResponse::new("IP cache", removed))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let (stats, valid, expired, avg_age) = state.pipeline.cache_stats().await;
    Json(CacheStatsResponse::new(stats, valid, expired, avg_age))
}

/// Handler for GET /limits
pub async fn limits_handler(State(state): State<AppState>) -> Json<LimitsResponse> {
    Json(state.pipeline.limiter_snapshot().await)
}

/// Handler for DELETE /limits
pub async fn limits_clear_handler(State(state): State<AppState>) -> Json<ClearedResponse> {
    let removed = state.pipeline.clear_limits().await;
    Json(ClearedResponse::new("Rate limits", removed))
}

/// Handler for PUT /limits
pub async fn limits_window_handler(
    State(state): State<AppState>,
    Json(req): Json<SetWindowRequest>,
) -> Result<Json<WindowResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(PipelineError::InvalidRequest(error_msg));
    }

    state.pipeline.set_rate_window(req.seconds).await;
    Ok(Json(WindowResponse::new(req.seconds)))
}

/// Handler for POST /forms/mailing
pub async fn mailing_handler(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<Json<FormResponse>> {
    let sink = state.sink()?;
    submit_signup(
        sink.as_ref(),
        &state.mailing_gate,
        &state.mailing_table,
        &input,
    )
    .await?;
    Ok(Json(FormResponse::submitted()))
}

/// Handler for POST /forms/contact
pub async fn contact_handler(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> Result<Json<FormResponse>> {
    let sink = state.sink()?;
    submit_contact(
        sink.as_ref(),
        &state.contact_gate,
        &state.contact_table,
        &input,
    )
    .await?;
    Ok(Json(FormResponse::submitted()))
}
