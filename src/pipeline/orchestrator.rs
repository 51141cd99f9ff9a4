//! Visitor Logging Orchestrator
//!
//! One pipeline object, constructed at startup, owns the IP cache, the
//! rate-limit table, the session and the trigger gates behind a single async
//! mutex. Every trigger call site dispatches through [`VisitorPipeline::log_visitor`],
//! so two triggers landing in the same instant cannot both pass the latch or
//! gate checks.
//!
//! Logging is best-effort: the rate-limit window is consumed before the
//! remote insert is attempted, so a failed insert still uses up the window
//! and that visit is dropped (at-most-once per window, no retry, no queue).

use std::str::FromStr;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::current_timestamp_ms;
use crate::config::Config;
use crate::error::PipelineError;
use crate::geo::{GeoLookup, IpCache, IpCacheSnapshot, IpCacheStats};
use crate::limiter::{RateLimitSnapshot, RateLimitTable};
use crate::pipeline::{VisitContext, VisitorLogRecord, VisitorMetadata};
use crate::remote::ReadyReceiver;
use crate::session::Session;

// == Trigger ==
/// Independent call sites into the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Remote-readiness signal, at most once per process (boolean latch)
    Initial,
    /// Timer fired because the readiness signal was late; shares the latch
    Fallback,
    /// Visitor returned to the page; gated to once per five minutes
    Visibility,
    /// Process shutdown; gated to once per minute since the last visibility log
    Unload,
    /// Diagnostic invocation; no gate beyond the rate limiter
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Initial => "initial",
            Trigger::Fallback => "fallback",
            Trigger::Visibility => "visibility",
            Trigger::Unload => "unload",
            Trigger::Manual => "manual",
        }
    }
}

impl FromStr for Trigger {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Trigger::Initial),
            "fallback" => Ok(Trigger::Fallback),
            "visibility" => Ok(Trigger::Visibility),
            "unload" => Ok(Trigger::Unload),
            "manual" => Ok(Trigger::Manual),
            other => Err(PipelineError::InvalidRequest(format!(
                "unknown trigger '{other}'"
            ))),
        }
    }
}

// == Log Outcome ==
/// Explicit result of one log attempt. Returned to every call site; the
/// drop-on-failure policy lives here instead of in swallowed errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutcome {
    /// Record accepted by the remote sink
    Logged,
    /// Latch or trigger gate suppressed the attempt
    Skipped,
    /// The resolved IP is inside its rate-limit window
    RateLimited,
    /// No sink handle exists yet; nothing was attempted
    NoRemoteClient,
    /// The pre-write read probe failed; nothing was written
    ProbeFailed,
    /// The insert itself failed; the window stays consumed
    InsertFailed,
}

impl LogOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOutcome::Logged => "logged",
            LogOutcome::Skipped => "skipped",
            LogOutcome::RateLimited => "rate_limited",
            LogOutcome::NoRemoteClient => "no_remote_client",
            LogOutcome::ProbeFailed => "probe_failed",
            LogOutcome::InsertFailed => "insert_failed",
        }
    }
}

// == Pipeline State ==
/// Mutable state owned by the orchestrator, guarded by one mutex.
#[derive(Debug)]
struct PipelineState {
    ip_cache: IpCache,
    rate_limits: RateLimitTable,
    session: Option<Session>,
    initial_logged: bool,
    /// Timestamp of the last visibility-triggered log (ms); also gates the
    /// shutdown log
    last_visibility_log: u64,
}

// == Visitor Pipeline ==
/// The orchestrator. Fire-and-forget from the caller's perspective:
/// `log_visitor` always returns an outcome, never an error.
pub struct VisitorPipeline {
    state: Mutex<PipelineState>,
    geo: Box<dyn GeoLookup>,
    remote: ReadyReceiver,
    log_table: String,
    visibility_gate_ms: u64,
    unload_gate_ms: u64,
    extended_schema: bool,
}

impl VisitorPipeline {
    /// Builds the pipeline from configuration, a lookup implementation and
    /// the readiness receiver.
    pub fn new(config: &Config, geo: Box<dyn GeoLookup>, remote: ReadyReceiver) -> Self {
        Self {
            state: Mutex::new(PipelineState {
                ip_cache: IpCache::new(config.ip_cache_max, config.ip_cache_ttl_secs),
                rate_limits: RateLimitTable::new(
                    config.rate_limit_max,
                    config.rate_limit_window_secs,
                ),
                session: None,
                initial_logged: false,
                last_visibility_log: 0,
            }),
            geo,
            remote,
            log_table: config.log_table.clone(),
            visibility_gate_ms: config.visibility_gate_secs * 1000,
            unload_gate_ms: config.unload_gate_secs * 1000,
            extended_schema: config.extended_schema,
        }
    }

    /// Returns true once the readiness signal has been announced.
    pub fn remote_ready(&self) -> bool {
        self.remote.borrow().is_some()
    }

    // == Log Visitor ==
    /// Runs one best-effort log attempt for the given trigger.
    ///
    /// The state lock is held across the whole attempt, serializing trigger
    /// dispatch; gate decisions, the lazy session, location resolution and the
    /// rate-limit mark all happen under it.
    pub async fn log_visitor(&self, trigger: Trigger, ctx: VisitContext) -> LogOutcome {
        let mut state = self.state.lock().await;
        let now = current_timestamp_ms();

        match trigger {
            Trigger::Initial | Trigger::Fallback => {
                if state.initial_logged {
                    debug!(trigger = trigger.as_str(), "initial visit already logged");
                    return LogOutcome::Skipped;
                }
                state.initial_logged = true;
            }
            Trigger::Visibility => {
                if now.saturating_sub(state.last_visibility_log) < self.visibility_gate_ms {
                    debug!("visibility log gate active, skipping");
                    return LogOutcome::Skipped;
                }
                state.last_visibility_log = now;
            }
            Trigger::Unload => {
                if now.saturating_sub(state.last_visibility_log) < self.unload_gate_ms {
                    debug!("logged recently, skipping final visit");
                    return LogOutcome::Skipped;
                }
            }
            Trigger::Manual => {}
        }

        let session = match &mut state.session {
            Some(session) => {
                session.record_view();
                session.clone()
            }
            None => {
                let session = Session::new();
                state.session = Some(session.clone());
                session
            }
        };

        let metadata = VisitorMetadata::collect(&ctx);
        let location = state.ip_cache.resolve(self.geo.as_ref()).await;

        if state.rate_limits.is_limited(&location.ip) {
            info!(ip = %location.ip, "IP rate limited, skipping visitor log");
            return LogOutcome::RateLimited;
        }
        // Window consumed now, before the write is attempted.
        state.rate_limits.mark_logged(&location.ip);

        let Some(sink) = self.remote.borrow().clone() else {
            debug!("remote sink not available, skipping visitor log");
            return LogOutcome::NoRemoteClient;
        };

        if let Err(err) = sink.select_count(&self.log_table).await {
            warn!(%err, "remote read probe failed, skipping visitor log");
            return LogOutcome::ProbeFailed;
        }

        let record = VisitorLogRecord::build(&metadata, &location, &session, self.extended_schema);
        let row = match serde_json::to_value(&record) {
            Ok(row) => row,
            Err(err) => {
                error!(%err, "could not serialize visitor record");
                return LogOutcome::InsertFailed;
            }
        };

        match sink.insert(&self.log_table, vec![row]).await {
            Ok(()) => {
                info!(
                    trigger = trigger.as_str(),
                    ip = %record.ip,
                    page = %record.page,
                    "visitor logged"
                );
                LogOutcome::Logged
            }
            Err(err) => {
                error!(%err, "visitor insert failed");
                LogOutcome::InsertFailed
            }
        }
    }

    // == Diagnostics ==
    /// Current cache contents with age and validity per entry.
    pub async fn cache_snapshot(&self) -> IpCacheSnapshot {
        self.state.lock().await.ip_cache.snapshot()
    }

    /// Cache behavior counters plus valid/expired breakdown and average age.
    pub async fn cache_stats(&self) -> (IpCacheStats, usize, usize, u64) {
        let state = self.state.lock().await;
        let (valid, expired, avg_age_secs) = state.ip_cache.age_breakdown();
        (state.ip_cache.stats(), valid, expired, avg_age_secs)
    }

    /// Clears the cache; returns how many entries were removed.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.state.lock().await.ip_cache.clear();
        info!(removed, "IP cache cleared");
        removed
    }

    /// Current rate-limit table with remaining window per IP.
    pub async fn limiter_snapshot(&self) -> RateLimitSnapshot {
        self.state.lock().await.rate_limits.snapshot()
    }

    /// Clears the rate-limit table; returns how many entries were removed.
    pub async fn clear_limits(&self) -> usize {
        let removed = self.state.lock().await.rate_limits.clear();
        info!(removed, "rate limits cleared");
        removed
    }

    /// Reconfigures the rate-limit window at runtime.
    pub async fn set_rate_window(&self, secs: u64) {
        self.state.lock().await.rate_limits.set_window_secs(secs);
    }

    /// Current session token and page-view count, if a session exists.
    pub async fn session_info(&self) -> Option<(String, u64)> {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| (s.id.clone(), s.page_views))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Result};
    use crate::geo::GeoResponse;
    use crate::remote::{ready_channel, ReadySender, RemoteSink};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    struct StaticLookup(GeoResponse);

    #[async_trait]
    impl GeoLookup for StaticLookup {
        async fn fetch(&self) -> Result<GeoResponse> {
            Ok(self.0.clone())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl GeoLookup for FailingLookup {
        async fn fetch(&self) -> Result<GeoResponse> {
            Err(PipelineError::Lookup("timed out".to_string()))
        }
    }

    #[derive(Default)]
    struct MockSink {
        inserts: StdMutex<Vec<(String, Vec<Value>)>>,
        fail_insert: AtomicBool,
        fail_probe: AtomicBool,
        probes: StdMutex<Vec<String>>,
    }

    impl MockSink {
        fn insert_count(&self) -> usize {
            self.inserts.lock().unwrap().len()
        }

        fn last_row(&self) -> Value {
            let inserts = self.inserts.lock().unwrap();
            let (_, rows) = inserts.last().unwrap().clone();
            rows[0].clone()
        }
    }

    #[async_trait]
    impl RemoteSink for MockSink {
        async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<()> {
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(PipelineError::Sink("insert rejected".to_string()));
            }
            self.inserts.lock().unwrap().push((table.to_string(), rows));
            Ok(())
        }

        async fn select_count(&self, table: &str) -> Result<u64> {
            self.probes.lock().unwrap().push(table.to_string());
            if self.fail_probe.load(Ordering::SeqCst) {
                return Err(PipelineError::Sink("probe rejected".to_string()));
            }
            Ok(0)
        }
    }

    fn testland_lookup() -> Box<StaticLookup> {
        Box::new(StaticLookup(GeoResponse {
            ip: Some("1.2.3.4".to_string()),
            country_name: Some("Testland".to_string()),
            city: Some("Test City".to_string()),
            region: Some("TS".to_string()),
        }))
    }

    fn ready_pipeline(
        geo: Box<dyn GeoLookup>,
        sink: Arc<MockSink>,
        config: Config,
    ) -> (VisitorPipeline, ReadySender) {
        let (tx, rx) = ready_channel();
        tx.send(Some(sink as crate::remote::SharedSink)).unwrap();
        (VisitorPipeline::new(&config, geo, rx), tx)
    }

    #[tokio::test]
    async fn test_no_remote_client_skips_without_insert() {
        let (_tx, rx) = ready_channel();
        let pipeline = VisitorPipeline::new(&Config::default(), testland_lookup(), rx);

        let outcome = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        assert_eq!(outcome, LogOutcome::NoRemoteClient);
    }

    #[tokio::test]
    async fn test_initial_visit_logged_once() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        let first = pipeline
            .log_visitor(Trigger::Initial, VisitContext::default())
            .await;
        let second = pipeline
            .log_visitor(Trigger::Fallback, VisitContext::default())
            .await;

        assert_eq!(first, LogOutcome::Logged);
        assert_eq!(second, LogOutcome::Skipped);
        assert_eq!(sink.insert_count(), 1);
    }

    #[tokio::test]
    async fn test_record_shape() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        pipeline
            .log_visitor(
                Trigger::Manual,
                VisitContext {
                    page: Some("/tour".to_string()),
                    ..VisitContext::default()
                },
            )
            .await;

        let row = sink.last_row();
        assert_eq!(row["ip"], "1.2.3.4");
        assert_eq!(row["country"], "Testland");
        assert_eq!(row["page"], "/tour");
        assert!(row.get("session_id").is_none());
    }

    #[tokio::test]
    async fn test_extended_schema_transmits_session() {
        let config = Config {
            extended_schema: true,
            ..Config::default()
        };
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), config);

        pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;

        let row = sink.last_row();
        assert!(row["session_id"].as_str().unwrap().starts_with("session_"));
        assert_eq!(row["page_views"], 1);
        assert_eq!(row["referrer"], "direct");
    }

    #[tokio::test]
    async fn test_second_attempt_is_rate_limited() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        let first = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        let second = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;

        assert_eq!(first, LogOutcome::Logged);
        assert_eq!(second, LogOutcome::RateLimited);
        assert_eq!(sink.insert_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ip_is_never_rate_limited() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) =
            ready_pipeline(Box::new(FailingLookup), sink.clone(), Config::default());

        let first = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        let second = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;

        assert_eq!(first, LogOutcome::Logged);
        assert_eq!(second, LogOutcome::Logged);
        assert_eq!(sink.last_row()["ip"], "unknown");
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_but_consumes_window() {
        let sink = Arc::new(MockSink::default());
        sink.fail_probe.store(true, Ordering::SeqCst);
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        let first = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        assert_eq!(first, LogOutcome::ProbeFailed);
        assert_eq!(sink.insert_count(), 0);

        // A failed attempt still consumed the rate-limit window.
        sink.fail_probe.store(false, Ordering::SeqCst);
        let second = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        assert_eq!(second, LogOutcome::RateLimited);
    }

    #[tokio::test]
    async fn test_insert_failure_is_absorbed() {
        let sink = Arc::new(MockSink::default());
        sink.fail_insert.store(true, Ordering::SeqCst);
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        let outcome = pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        assert_eq!(outcome, LogOutcome::InsertFailed);
        assert_eq!(sink.insert_count(), 0);
    }

    #[tokio::test]
    async fn test_visibility_gate() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        let first = pipeline
            .log_visitor(Trigger::Visibility, VisitContext::default())
            .await;
        let second = pipeline
            .log_visitor(Trigger::Visibility, VisitContext::default())
            .await;

        assert_eq!(first, LogOutcome::Logged);
        assert_eq!(second, LogOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_unload_gated_by_recent_visibility_log() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        pipeline
            .log_visitor(Trigger::Visibility, VisitContext::default())
            .await;
        let outcome = pipeline
            .log_visitor(Trigger::Unload, VisitContext::default())
            .await;
        assert_eq!(outcome, LogOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_unload_logs_without_recent_activity() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink.clone(), Config::default());

        let outcome = pipeline
            .log_visitor(Trigger::Unload, VisitContext::default())
            .await;
        assert_eq!(outcome, LogOutcome::Logged);
    }

    #[tokio::test]
    async fn test_session_is_lazy_and_monotonic() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(Box::new(FailingLookup), sink, Config::default());

        assert!(pipeline.session_info().await.is_none());

        pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        let (id1, views1) = pipeline.session_info().await.unwrap();
        assert_eq!(views1, 1);

        pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        let (id2, views2) = pipeline.session_info().await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(views2, 2);
    }

    #[tokio::test]
    async fn test_trigger_parsing() {
        assert_eq!("manual".parse::<Trigger>().unwrap(), Trigger::Manual);
        assert_eq!("visibility".parse::<Trigger>().unwrap(), Trigger::Visibility);
        assert!("bogus".parse::<Trigger>().is_err());
    }

    #[tokio::test]
    async fn test_diagnostics_reset_state() {
        let sink = Arc::new(MockSink::default());
        let (pipeline, _tx) = ready_pipeline(testland_lookup(), sink, Config::default());

        pipeline
            .log_visitor(Trigger::Manual, VisitContext::default())
            .await;
        assert!(pipeline.cache_snapshot().await.size > 0);
        assert_eq!(pipeline.limiter_snapshot().await.size, 1);

        assert_eq!(pipeline.clear_cache().await, 2);
        assert_eq!(pipeline.clear_limits().await, 1);
        assert_eq!(pipeline.cache_snapshot().await.size, 0);
    }
}
