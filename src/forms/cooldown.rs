//! Submission Cooldown
//!
//! Per-form gate enforcing a minimum gap between submissions, independent of
//! the IP rate limiter. Marked only on successful submission, so a failure
//! can be retried immediately.

use std::sync::Mutex;

use crate::clock::current_timestamp_ms;
use crate::error::{PipelineError, Result};

// == Submission Gate ==
#[derive(Debug)]
pub struct SubmissionGate {
    last_submission_ms: Mutex<u64>,
    cooldown_ms: u64,
}

impl SubmissionGate {
    /// Creates a gate with the given cooldown.
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            last_submission_ms: Mutex::new(0),
            cooldown_ms: cooldown_secs * 1000,
        }
    }

    /// Errors with the remaining wait if the cooldown is still active.
    pub fn check(&self) -> Result<()> {
        self.check_at(current_timestamp_ms())
    }

    /// Cooldown check against an explicit clock reading.
    pub fn check_at(&self, now: u64) -> Result<()> {
        let last = *self
            .last_submission_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let elapsed = now.saturating_sub(last);
        if last > 0 && elapsed < self.cooldown_ms {
            return Err(PipelineError::Cooldown {
                remaining_secs: (self.cooldown_ms - elapsed).div_ceil(1000),
            });
        }
        Ok(())
    }

    /// Records a successful submission at now.
    pub fn mark(&self) {
        self.mark_at(current_timestamp_ms());
    }

    /// Records a successful submission at an explicit clock reading.
    pub fn mark_at(&self, now: u64) {
        *self
            .last_submission_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }
}
