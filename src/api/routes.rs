//! API Routes
//!
//! Configures the Axum router for the diagnostic surface. Intended for local
//! debugging only; carries no authentication.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_clear_handler, cache_handler, cache_stats_handler, contact_handler, health_handler,
    limits_clear_handler, limits_handler, limits_window_handler, log_handler, mailing_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Liveness and remote readiness
/// - `POST /log` - Manual log trigger
/// - `GET /cache` / `DELETE /cache` - Inspect / clear the IP cache
/// - `GET /cache/stats` - Cache statistics
/// - `GET /limits` / `DELETE /limits` / `PUT /limits` - Rate-limit table
/// - `POST /forms/mailing` - Mailing-list signup
/// - `POST /forms/contact` - Contact form
///
/// # Middleware
/// - CORS: Allows any origin (the surface is loopback-bound)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/log", post(log_handler))
        .route(
            "/cache",
            get(cache_handler).delete(cache_clear_handler),
        )
        .route("/cache/stats", get(cache_stats_handler))
        .route(
            "/limits",
            get(limits_handler)
                .delete(limits_clear_handler)
                .put(limits_window_handler),
        )
        .route("/forms/mailing", post(mailing_handler))
        .route("/forms/contact", post(contact_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
