//! Session Module
//!
//! Opaque session token and page-view counter. Created lazily on the first
//! log attempt, stable for the process lifetime, never persisted.

use uuid::Uuid;

// == Session ==
/// Tracks the current process's visit session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque random token, stable once generated
    pub id: String,
    /// Number of log attempts within this session; only increases
    pub page_views: u64,
}

impl Session {
    /// Creates a new session with a fresh token and one recorded view.
    pub fn new() -> Self {
        Self {
            id: format!("session_{}", Uuid::new_v4().simple()),
            page_views: 1,
        }
    }

    /// Increments the page-view counter.
    pub fn record_view(&mut self) {
        self.page_views += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_shape() {
        let session = Session::new();
        assert!(session.id.starts_with("session_"));
        assert_eq!(session.page_views, 1);
    }

    #[test]
    fn test_session_tokens_are_unique() {
        assert_ne!(Session::new().id, Session::new().id);
    }

    #[test]
    fn test_page_views_only_increase() {
        let mut session = Session::new();
        session.record_view();
        session.record_view();
        assert_eq!(session.page_views, 3);
    }
}
