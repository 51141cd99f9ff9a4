//! Pipeline Module
//!
//! The visitor-logging orchestrator and the records it builds.

mod metadata;
mod orchestrator;

pub use metadata::{VisitContext, VisitorLogRecord, VisitorMetadata};
pub use orchestrator::{LogOutcome, Trigger, VisitorPipeline};
