use super::*;

// =============================================================================
// Role
// =============================================================================

#[test]
fn role_from_backend_maps_known_roles() {
    assert_eq!(Role::from_backend(Some("admin")), Role::Admin);
    assert_eq!(Role::from_backend(Some(" Staff ")), Role::Staff);
    assert_eq!(Role::from_backend(Some("user")), Role::User);
}

#[test]
fn role_from_backend_never_yields_guest() {
    assert_eq!(Role::from_backend(Some("guest")), Role::User);
    assert_eq!(Role::from_backend(Some("superuser")), Role::User);
    assert_eq!(Role::from_backend(None), Role::User);
}

#[test]
fn role_is_staff_only_for_staff_and_admin() {
    assert!(Role::Admin.is_staff());
    assert!(Role::Staff.is_staff());
    assert!(!Role::User.is_staff());
    assert!(!Role::Guest.is_staff());
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
    let parsed: Role = serde_json::from_str("\"staff\"").unwrap();
    assert_eq!(parsed, Role::Staff);
}

// =============================================================================
// Identity / Session
// =============================================================================

#[test]
fn guest_identity_uses_session_id() {
    let id = Identity::guest("abc123");
    assert_eq!(id.id, "abc123");
    assert!(id.is_guest());
    assert!(!id.is_staff());
    assert!(id.email.is_none());
}

#[test]
fn new_session_is_not_local_only() {
    let session = Session::new("s1".into(), "tok".into(), true);
    assert!(session.is_anonymous);
    assert!(!session.is_local_only);
}

#[test]
fn session_token_is_never_serialized() {
    let session = Session::new("s1".into(), "secret-token".into(), true);
    let json = serde_json::to_string(&session).unwrap();
    assert!(json.contains("s1"));
    assert!(!json.contains("secret-token"));
}

#[test]
fn loading_state_serializes_kebab_case() {
    let v = serde_json::to_value(AuthLoadingState::ResolvedUnauthenticated).unwrap();
    assert_eq!(v, "resolved-unauthenticated");
}

// =============================================================================
// Phase
// =============================================================================

#[test]
fn phase_transitions_from_unresolved() {
    let phase = Phase::of(None);
    assert_eq!(phase, Phase::Unresolved);
    assert!(phase.can_login());
    assert!(phase.can_continue_as_guest());
}

#[test]
fn phase_guest_may_login_or_restart() {
    let guest = Identity::guest("s1");
    let phase = Phase::of(Some(&guest));
    assert_eq!(phase, Phase::Guest);
    assert!(phase.can_login());
    assert!(phase.can_continue_as_guest());
}

#[test]
fn phase_authenticated_rejects_login_and_guest() {
    let user = Identity { id: "u1".into(), role: Role::Staff, display_name: "S".into(), email: None };
    let phase = Phase::of(Some(&user));
    assert_eq!(phase, Phase::Authenticated(Role::Staff));
    assert!(!phase.can_login());
    assert!(!phase.can_continue_as_guest());
}

// =============================================================================
// Snapshot / errors
// =============================================================================

#[test]
fn snapshot_constructors_set_loading_state() {
    assert!(IdentitySnapshot::pending().loading.is_pending());
    assert_eq!(IdentitySnapshot::unauthenticated().loading, AuthLoadingState::ResolvedUnauthenticated);
    let snap = IdentitySnapshot::authenticated(Identity::guest("g"), Session::new("g".into(), "t".into(), true));
    assert_eq!(snap.loading, AuthLoadingState::ResolvedAuthenticated);
    assert_eq!(snap.phase(), Phase::Guest);
    assert!(!snap.is_staff());
}

#[test]
fn auth_error_kinds_are_stable() {
    assert_eq!(AuthError::InvalidCredentials.kind(), "invalid-credentials");
    assert_eq!(AuthError::Network("x".into()).kind(), "network-error");
    assert_eq!(AuthError::Server("x".into()).kind(), "server-error");
    assert_eq!(AuthError::PersistenceUnavailable("x".into()).kind(), "persistence-unavailable");
    let err = AuthError::IllegalTransition { action: "log in", role: "admin" };
    assert_eq!(err.kind(), "illegal-transition");
    assert_eq!(err.to_string(), "cannot log in while signed in as admin");
}
