//! Background Tasks Module
//!
//! Contains tasks that run alongside the diagnostic server.
//!
//! # Tasks
//! - Visit triggers: initial and fallback log attempts at startup

mod triggers;

pub use triggers::spawn_visit_triggers;
