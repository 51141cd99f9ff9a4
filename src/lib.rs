//! Visit Logger - a visitor logging daemon
//!
//! Resolves visitor IP/location through a bounded cache, applies per-IP rate
//! limiting, and writes best-effort log records to a hosted backend-as-a-service.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod forms;
pub mod geo;
pub mod limiter;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod session;
pub mod tasks;


pub use api::AppState;
pub use config::Config;
pub use pipeline::{LogOutcome, Trigger, VisitorPipeline};
pub use tasks::spawn_visit_triggers;
