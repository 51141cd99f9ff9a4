//! Request DTOs for the diagnostic API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::pipeline::VisitContext;

/// Request body for the manual log trigger (POST /log)
///
/// # Fields
/// - `trigger`: trigger name (default `"manual"`; `"visibility"` and
///   `"unload"` go through their gates)
/// - remaining fields: optional visit context, defaulted during collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogTriggerRequest {
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub screen_resolution: Option<String>,
    #[serde(default)]
    pub viewport: Option<String>,
}

impl LogTriggerRequest {
    /// Splits the request into the trigger name and the visit context.
    pub fn into_parts(self) -> (String, VisitContext) {
        let trigger = self.trigger.unwrap_or_else(|| "manual".to_string());
        let ctx = VisitContext {
            page: self.page,
            user_agent: self.user_agent,
            referrer: self.referrer,
            screen_resolution: self.screen_resolution,
            viewport: self.viewport,
        };
        (trigger, ctx)
    }
}

/// Request body for reconfiguring the rate-limit window (PUT /limits)
#[derive(Debug, Clone, Deserialize)]
pub struct SetWindowRequest {
    /// New window duration in seconds; must be positive
    pub seconds: u64,
}

impl SetWindowRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.seconds == 0 {
            return Some("Window must be at least 1 second".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_trigger_defaults_to_manual() {
        let req: LogTriggerRequest = serde_json::from_str("{}").unwrap();
        let (trigger, ctx) = req.into_parts();
        assert_eq!(trigger, "manual");
        assert!(ctx.page.is_none());
    }

    #[test]
    fn test_log_trigger_with_context() {
        let json = r#"{"trigger":"visibility","page":"/tour","referrer":"https://example.com"}"#;
        let req: LogTriggerRequest = serde_json::from_str(json).unwrap();
        let (trigger, ctx) = req.into_parts();
        assert_eq!(trigger, "visibility");
        assert_eq!(ctx.page.as_deref(), Some("/tour"));
    }

    #[test]
    fn test_set_window_zero_invalid() {
        let req = SetWindowRequest { seconds: 0 };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_set_window_valid() {
        let req = SetWindowRequest { seconds: 60 };
        assert!(req.validate().is_none());
    }
}
