use std::time::Duration;

use super::test_helpers::{MockBackend, test_app_state};
use super::*;
use crate::identity::model::{AuthLoadingState, Role};

fn admin_state() -> AppState {
    test_app_state(Arc::new(MockBackend::new().with_account("admin@x.com", "pw", "admin")))
}

// =============================================================================
// instance registry
// =============================================================================

#[tokio::test]
async fn missing_cookie_opens_new_instance() {
    let state = admin_state();
    let handle = state.instance(None, None).await;
    assert!(handle.created);
    assert_eq!(handle.id.len(), 64);
    assert_eq!(state.instance_count().await, 1);
}

#[tokio::test]
async fn known_cookie_reuses_instance() {
    let state = admin_state();
    let first = state.instance(None, None).await;
    let second = state.instance(Some(&first.id), None).await;
    assert!(!second.created);
    assert_eq!(second.id, first.id);
    assert!(Arc::ptr_eq(&first.ctx, &second.ctx));
    assert_eq!(state.instance_count().await, 1);
}

#[tokio::test]
async fn unknown_cookie_opens_fresh_instance() {
    let state = admin_state();
    let handle = state.instance(Some("forged-or-expired"), None).await;
    assert!(handle.created);
    assert_ne!(handle.id, "forged-or-expired");
}

#[tokio::test]
async fn new_instance_without_token_resolves_unauthenticated() {
    let state = admin_state();
    let handle = state.instance(None, None).await;
    let snap = handle.ctx.wait_resolved(Duration::from_secs(2)).await;
    assert_eq!(snap.loading, AuthLoadingState::ResolvedUnauthenticated);
}

#[tokio::test]
async fn new_instance_restores_from_session_token() {
    let state = admin_state();
    let first = state.instance(None, None).await;
    first.ctx.wait_resolved(Duration::from_secs(2)).await;
    first.ctx.login("admin@x.com", "pw").await.unwrap();
    let token = first.ctx.snapshot().session.unwrap().token;

    // Same browser after a restart: instance cookie gone, session cookie kept.
    let second = state.instance(None, Some(&token)).await;
    let snap = second.ctx.wait_resolved(Duration::from_secs(2)).await;
    assert_eq!(snap.identity.unwrap().role, Role::Admin);
}

#[tokio::test]
async fn instances_are_isolated() {
    let state = admin_state();
    let a = state.instance(None, None).await;
    let b = state.instance(None, None).await;
    a.ctx.wait_resolved(Duration::from_secs(2)).await;
    b.ctx.wait_resolved(Duration::from_secs(2)).await;
    a.ctx.login("admin@x.com", "pw").await.unwrap();
    assert!(a.ctx.is_staff());
    assert!(b.ctx.current_identity().is_none());
}

// =============================================================================
// registry bound
// =============================================================================

fn capped_state(max_instances: usize) -> AppState {
    let backend = Arc::new(MockBackend::new());
    let config = AppConfig { max_instances, ..AppConfig::default() };
    AppState::new(config, backend.clone(), backend, SessionStore::local_only())
}

#[tokio::test]
async fn registry_never_exceeds_max_instances() {
    let state = capped_state(8);
    for _ in 0..100 {
        state.instance(None, None).await;
    }
    assert_eq!(state.instance_count().await, 8);
}

#[tokio::test]
async fn full_registry_evicts_least_recently_seen() {
    let state = capped_state(2);
    let stale = state.instance(None, None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let busy = state.instance(None, None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    state.instance(None, None).await;

    assert!(!state.instance(Some(&busy.id), None).await.created);
    assert!(state.instance(Some(&stale.id), None).await.created);
}
