//! Visit Metadata Module
//!
//! Collected visit context, and the record actually transmitted to the sink.
//!
//! The transmitted field set is narrower than what is collected: the base
//! remote schema carries only ip, user_agent, timestamp, page, country, city
//! and region. The extended fields (session id, page views, screen, viewport,
//! referrer) are transmitted only when the `EXTENDED_SCHEMA` option is on;
//! the choice is explicit configuration, not a silent drop.

use serde::Serialize;

use crate::clock::iso_timestamp;
use crate::geo::LocationRecord;
use crate::session::Session;

// == Visit Context ==
/// Caller-supplied context for one log attempt. Anything absent falls back
/// to a process-level default during collection.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    pub page: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub screen_resolution: Option<String>,
    pub viewport: Option<String>,
}

// == Visitor Metadata ==
/// Fully collected metadata for one visit.
#[derive(Debug, Clone)]
pub struct VisitorMetadata {
    pub page: String,
    pub user_agent: String,
    pub referrer: String,
    pub screen_resolution: Option<String>,
    pub viewport: Option<String>,
}

impl VisitorMetadata {
    /// Fills in defaults: page `/`, a process user agent, referrer `direct`.
    pub fn collect(ctx: &VisitContext) -> Self {
        Self {
            page: ctx.page.clone().unwrap_or_else(|| "/".to_string()),
            user_agent: ctx.user_agent.clone().unwrap_or_else(|| {
                format!("visit_logger/{}", env!("CARGO_PKG_VERSION"))
            }),
            referrer: ctx.referrer.clone().unwrap_or_else(|| "direct".to_string()),
            screen_resolution: ctx.screen_resolution.clone(),
            viewport: ctx.viewport.clone(),
        }
    }
}

// == Visitor Log Record ==
/// The unit persisted to the remote log table.
#[derive(Debug, Clone, Serialize)]
pub struct VisitorLogRecord {
    pub ip: String,
    pub user_agent: String,
    /// ISO-8601 timestamp taken when the record is built
    pub timestamp: String,
    pub page: String,
    pub country: String,
    pub city: String,
    pub region: String,

    // Extended schema fields, present only when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl VisitorLogRecord {
    /// Builds the transmitted record from collected metadata and the
    /// resolved location.
    pub fn build(
        metadata: &VisitorMetadata,
        location: &LocationRecord,
        session: &Session,
        extended: bool,
    ) -> Self {
        Self {
            ip: location.ip.clone(),
            user_agent: metadata.user_agent.clone(),
            timestamp: iso_timestamp(),
            page: metadata.page.clone(),
            country: location.country.clone(),
            city: location.city.clone(),
            region: location.region.clone(),
            session_id: extended.then(|| session.id.clone()),
            page_views: extended.then_some(session.page_views),
            screen_resolution: if extended {
                metadata.screen_resolution.clone()
            } else {
                None
            },
            viewport: if extended {
                metadata.viewport.clone()
            } else {
                None
            },
            referrer: extended.then(|| metadata.referrer.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testland() -> LocationRecord {
        LocationRecord {
            ip: "1.2.3.4".to_string(),
            country: "Testland".to_string(),
            city: "Test City".to_string(),
            region: "TS".to_string(),
        }
    }

    #[test]
    fn test_collect_defaults() {
        let meta = VisitorMetadata::collect(&VisitContext::default());
        assert_eq!(meta.page, "/");
        assert_eq!(meta.referrer, "direct");
        assert!(meta.user_agent.starts_with("visit_logger/"));
    }

    #[test]
    fn test_collect_prefers_context() {
        let ctx = VisitContext {
            page: Some("/tour".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            referrer: Some("https://example.com".to_string()),
            ..VisitContext::default()
        };
        let meta = VisitorMetadata::collect(&ctx);
        assert_eq!(meta.page, "/tour");
        assert_eq!(meta.user_agent, "Mozilla/5.0");
        assert_eq!(meta.referrer, "https://example.com");
    }

    #[test]
    fn test_base_record_omits_extended_fields() {
        let meta = VisitorMetadata::collect(&VisitContext::default());
        let record = VisitorLogRecord::build(&meta, &testland(), &Session::new(), false);

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 7);
        assert!(obj.contains_key("ip"));
        assert!(obj.contains_key("user_agent"));
        assert!(obj.contains_key("timestamp"));
        assert!(obj.contains_key("page"));
        assert!(obj.contains_key("country"));
        assert!(obj.contains_key("city"));
        assert!(obj.contains_key("region"));
    }

    #[test]
    fn test_extended_record_carries_session_fields() {
        let meta = VisitorMetadata::collect(&VisitContext {
            screen_resolution: Some("1920x1080".to_string()),
            viewport: Some("1280x720".to_string()),
            ..VisitContext::default()
        });
        let mut session = Session::new();
        session.record_view();
        let record = VisitorLogRecord::build(&meta, &testland(), &session, true);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["page_views"], 2);
        assert_eq!(json["screen_resolution"], "1920x1080");
        assert_eq!(json["referrer"], "direct");
        assert!(json["session_id"].as_str().unwrap().starts_with("session_"));
    }

    #[test]
    fn test_all_unknown_record_serializes() {
        let meta = VisitorMetadata::collect(&VisitContext::default());
        let record =
            VisitorLogRecord::build(&meta, &LocationRecord::unknown(), &Session::new(), false);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ip"], "unknown");
        assert_eq!(json["country"], "unknown");
    }
}
