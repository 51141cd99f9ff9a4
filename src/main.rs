//! Visit Logger - a visitor logging daemon
//!
//! Resolves visitor IP/location through a bounded cache, applies per-IP rate
//! limiting, and writes best-effort log records to a hosted backend-as-a-service.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables (missing remote secrets
//!    are a warning, not a failure)
//! 3. Construct the readiness channel and spawn the remote initializer
//! 4. Construct the visitor pipeline and spawn the startup trigger task
//! 5. Serve the diagnostic API on loopback
//! 6. On SIGINT/SIGTERM, fire the final unload-gated log attempt and exit

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visit_logger::api::{create_router, AppState};
use visit_logger::config::Config;
use visit_logger::geo::HttpGeoLookup;
use visit_logger::pipeline::{Trigger, VisitContext, VisitorPipeline};
use visit_logger::remote::{ready_channel, spawn_remote_init};
use visit_logger::tasks::spawn_visit_triggers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visit_logger=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting visit logger");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_max={}, cache_ttl={}s, rate_window={}s, port={}",
        config.ip_cache_max,
        config.ip_cache_ttl_secs,
        config.rate_limit_window_secs,
        config.server_port
    );
    if !config.remote_configured() {
        warn!("REMOTE_URL / REMOTE_API_KEY not set; remote features disabled");
    }

    let (ready_tx, ready_rx) = ready_channel();
    let init_handle = spawn_remote_init(&config, ready_tx);

    let geo = Box::new(HttpGeoLookup::new(config.geo_endpoint.clone()));
    let pipeline = Arc::new(VisitorPipeline::new(&config, geo, ready_rx.clone()));
    let trigger_handle =
        spawn_visit_triggers(pipeline.clone(), ready_rx.clone(), config.fallback_delay_ms);

    let state = AppState::new(pipeline.clone(), ready_rx, &config);
    let app = create_router(state);

    // Diagnostic surface is unauthenticated; bind loopback only.
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Diagnostic API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Final visit log on the way out, gated to once per minute.
    let outcome = pipeline
        .log_visitor(Trigger::Unload, VisitContext::default())
        .await;
    info!(outcome = outcome.as_str(), "final visit log attempted");

    init_handle.abort();
    trigger_handle.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
