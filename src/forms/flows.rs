//! Form Submission Flows
//!
//! Mailing-list signup and contact form: cooldown check, local validation,
//! one remote insert, no automatic retry. Failures surface to the caller as
//! error values; the cooldown is marked only after a successful insert.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::iso_timestamp;
use crate::error::{PipelineError, Result};
use crate::forms::{
    validate_email, validate_message, validate_name, validate_phone, SubmissionGate,
};
use crate::remote::RemoteSink;

// == Mailing List ==
/// Raw mailing-list signup input.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Validated record persisted to the mailing-list table.
#[derive(Debug, Clone, Serialize)]
pub struct MailingSignup {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Bare digits only
    pub phone_number: String,
    pub time_stamp: String,
}

impl MailingSignup {
    /// Validates and normalizes raw input into a persistable record.
    pub fn from_input(input: &SignupInput) -> Result<Self> {
        Ok(Self {
            first_name: validate_name("first_name", &input.first_name)?,
            last_name: validate_name("last_name", &input.last_name)?,
            email: validate_email(&input.email)?,
            phone_number: validate_phone(&input.phone)?,
            time_stamp: iso_timestamp(),
        })
    }
}

/// Runs the mailing-list signup flow against the sink.
pub async fn submit_signup(
    sink: &dyn RemoteSink,
    gate: &SubmissionGate,
    table: &str,
    input: &SignupInput,
) -> Result<()> {
    gate.check()?;
    let record = MailingSignup::from_input(input)?;

    let row = serde_json::to_value(&record)
        .map_err(|e| PipelineError::Sink(format!("could not serialize signup: {e}")))?;
    sink.insert(table, vec![row]).await?;

    gate.mark();
    info!(email = %record.email, "mailing-list signup submitted");
    Ok(())
}

// == Contact Form ==
/// Raw contact form input.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Validated record persisted to the contact table.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
    pub time_stamp: String,
}

impl ContactMessage {
    /// Validates and normalizes raw input into a persistable record.
    pub fn from_input(input: &ContactInput) -> Result<Self> {
        Ok(Self {
            name: validate_name("name", &input.name)?,
            email: validate_email(&input.email)?,
            message: validate_message(&input.message)?,
            time_stamp: iso_timestamp(),
        })
    }
}

/// Runs the contact form flow against the sink.
pub async fn submit_contact(
    sink: &dyn RemoteSink,
    gate: &SubmissionGate,
    table: &str,
    input: &ContactInput,
) -> Result<()> {
    gate.check()?;
    let record = ContactMessage::from_input(input)?;

    let row = serde_json::to_value(&record)
        .map_err(|e| PipelineError::Sink(format!("could not serialize message: {e}")))?;
    sink.insert(table, vec![row]).await?;

    gate.mark();
    info!(email = %record.email, "contact message submitted");
    Ok(())
}
