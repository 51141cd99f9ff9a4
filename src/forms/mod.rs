//! Forms Module
//!
//! Client-side validation, resubmission cooldowns, and the two remote
//! submission flows (mailing-list signup, contact form).

mod cooldown;
mod flows;
mod validate;

pub use cooldown::SubmissionGate;
pub use flows::{
    submit_contact, submit_signup, ContactInput, ContactMessage, MailingSignup, SignupInput,
};
pub use validate::{validate_email, validate_message, validate_name, validate_phone};
