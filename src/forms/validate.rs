//! Form Field Validation
//!
//! Local predicate checks run before any remote submission. Each validator
//! returns the normalized value on success.

use crate::error::{PipelineError, Result};

fn invalid(field: &str, message: &str) -> PipelineError {
    PipelineError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Name fields must be at least 2 characters after trimming.
pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err(invalid(field, "must be at least 2 characters long"));
    }
    Ok(trimmed.to_string())
}

/// Emails must look like `local@domain.tld`: no whitespace, exactly one `@`,
/// non-empty local part, and a dot inside the domain.
pub fn validate_email(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let mut parts = trimmed.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !trimmed.contains(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        _ => false,
    };
    if !valid {
        return Err(invalid("email", "must be a valid email address"));
    }
    Ok(trimmed.to_string())
}

/// Phone numbers must contain exactly 10 digits; all other characters are
/// stripped and the bare digits returned.
pub fn validate_phone(value: &str) -> Result<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 10 {
        return Err(invalid(
            "phone",
            "must be exactly 10 digits (including area code)",
        ));
    }
    Ok(digits)
}

/// Contact messages must be non-empty after trimming.
pub fn validate_message(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid("message", "must not be empty"));
    }
    Ok(trimmed.to_string())
}
