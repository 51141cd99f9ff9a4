//! Visit Trigger Task
//!
//! Drives the startup triggers into the orchestrator: the initial visit when
//! the readiness signal arrives, and a fallback attempt if the signal is late.
//! The orchestrator's latch ensures only one of the two logs the visit.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::pipeline::{Trigger, VisitContext, VisitorPipeline};
use crate::remote::ReadyReceiver;

/// Spawns the startup trigger task.
///
/// Waits on the readiness signal and fires the initial log. If the fallback
/// delay elapses first and the sink is already available, fires the fallback
/// log instead; otherwise keeps waiting for readiness.
///
/// # Arguments
/// * `pipeline` - shared orchestrator
/// * `ready` - readiness receiver
/// * `fallback_delay_ms` - delay before the fallback trigger fires
pub fn spawn_visit_triggers(
    pipeline: Arc<VisitorPipeline>,
    mut ready: ReadyReceiver,
    fallback_delay_ms: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if ready.borrow().is_some() {
            info!("remote sink already ready, logging initial visit");
            pipeline
                .log_visitor(Trigger::Initial, VisitContext::default())
                .await;
            return;
        }

        let fallback = tokio::time::sleep(Duration::from_millis(fallback_delay_ms));
        tokio::pin!(fallback);
        let mut fallback_pending = true;

        loop {
            tokio::select! {
                changed = ready.changed() => {
                    if ready.borrow().is_some() {
                        info!("readiness signal received, logging initial visit");
                        pipeline
                            .log_visitor(Trigger::Initial, VisitContext::default())
                            .await;
                        return;
                    }
                    if changed.is_err() {
                        debug!("readiness channel closed while still unready");
                        return;
                    }
                }
                _ = &mut fallback, if fallback_pending => {
                    fallback_pending = false;
                    if pipeline.remote_ready() {
                        info!("fallback delay reached, logging initial visit");
                        pipeline
                            .log_visitor(Trigger::Fallback, VisitContext::default())
                            .await;
                        return;
                    }
                    debug!("remote sink still not available at fallback deadline");
                }
            }
        }
    })
}
