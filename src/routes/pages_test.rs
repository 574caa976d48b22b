use std::time::Duration;

use axum::http::StatusCode;

use super::*;
use crate::config::AppConfig;
use crate::routes::test_client::TestClient;
use crate::services::session_store::{PersistenceError, SessionPersistence, SessionRecord, SessionStore};
use crate::state::test_helpers::MockBackend;

/// Remote session table that answers far slower than any page is willing to wait.
struct SlowPersistence;

#[async_trait::async_trait]
impl SessionPersistence for SlowPersistence {
    async fn insert(&self, _record: &SessionRecord) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn load(&self, _token: &str) -> Result<Option<SessionRecord>, PersistenceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn delete(&self, _token: &str) -> Result<(), PersistenceError> {
        Ok(())
    }
}

fn slow_restore_state() -> AppState {
    let backend = Arc::new(MockBackend::new());
    let config = AppConfig { restore_wait: Duration::from_millis(20), ..AppConfig::default() };
    AppState::new(config, backend.clone(), backend, SessionStore::new(Some(Arc::new(SlowPersistence))))
}

// =============================================================================
// nav_query
// =============================================================================

#[test]
fn nav_query_keeps_parsed_params() {
    let params = Ok(Query(HashMap::from([("mode".to_owned(), "login".to_owned())])));
    assert_eq!(nav_query(params).mode(), Some("login"));
}

// =============================================================================
// loading placeholder
// =============================================================================

#[tokio::test]
async fn pending_restore_renders_placeholder_with_refresh() {
    let mut c = TestClient::new(slow_restore_state());
    c.set_cookie(SESSION_COOKIE, "still-resolving");
    let resp = c.get("/admin/dashboard").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers.get(header::REFRESH).unwrap(), LOADING_REFRESH_SECS);
    assert!(resp.body.contains("Loading"));
    assert!(resp.location().is_none());
}

#[tokio::test]
async fn pending_restore_keeps_session_cookie() {
    let mut c = TestClient::new(slow_restore_state());
    c.set_cookie(SESSION_COOKIE, "still-resolving");
    c.get("/").await;
    assert_eq!(c.cookie(SESSION_COOKIE), Some("still-resolving"));
    assert!(c.cookie(INSTANCE_COOKIE).is_some());
}

#[tokio::test]
async fn public_pages_render_while_pending() {
    let mut c = TestClient::new(slow_restore_state());
    c.set_cookie(SESSION_COOKIE, "still-resolving");
    assert_eq!(c.get("/reset-password/abc").await.status, StatusCode::OK);
    assert_eq!(c.get("/nowhere").await.location(), Some("/"));
}

#[tokio::test]
async fn login_while_pending_wins_over_late_restore() {
    let backend = Arc::new(MockBackend::new().with_account("admin@x.com", "pw", "admin"));
    let config = AppConfig { restore_wait: Duration::from_millis(20), ..AppConfig::default() };
    let state = AppState::new(config, backend.clone(), backend, SessionStore::new(Some(Arc::new(SlowPersistence))));
    let mut c = TestClient::new(state);
    c.set_cookie(SESSION_COOKIE, "still-resolving");

    let resp = c.post_form("/auth/login", "email=admin%40x.com&password=pw").await;
    assert_eq!(resp.location(), Some("/admin/dashboard"));
    assert_eq!(c.get("/admin/dashboard").await.status, StatusCode::OK);
}

// =============================================================================
// form posts while pending
// =============================================================================

#[tokio::test]
async fn pending_form_posts_are_refused_with_retry_after() {
    let mut c = TestClient::new(slow_restore_state());
    c.set_cookie(SESSION_COOKIE, "still-resolving");
    for (uri, form) in [
        ("/search/bookmarks", "item=graph+theory"),
        ("/feedback-form", "rating=5&comment=great"),
        ("/admin/feedback/1", "status=Resolved"),
    ] {
        let resp = c.post_form(uri, form).await;
        assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(resp.headers.get(header::RETRY_AFTER).unwrap(), RETRY_AFTER_SECS, "{uri}");
        assert!(resp.headers.get(header::REFRESH).is_none(), "{uri}");
        assert!(resp.location().is_none(), "{uri}");
    }
    assert_eq!(c.cookie(SESSION_COOKIE), Some("still-resolving"));
}
