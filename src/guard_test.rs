use super::*;
use crate::identity::model::{AuthLoadingState, Role, Session};

fn snapshot_for(role: Option<Role>) -> IdentitySnapshot {
    match role {
        None => IdentitySnapshot::unauthenticated(),
        Some(Role::Guest) => {
            IdentitySnapshot::authenticated(Identity::guest("g-1"), Session::new("g-1".into(), "t".into(), true))
        }
        Some(role) => IdentitySnapshot::authenticated(
            Identity { id: "u-1".into(), role, display_name: "U".into(), email: None },
            Session::new("s-1".into(), "t".into(), false),
        ),
    }
}

fn pending_with(role: Option<Role>) -> IdentitySnapshot {
    let mut snap = snapshot_for(role);
    snap.loading = AuthLoadingState::Pending;
    snap
}

const ALL_ROLES: [Option<Role>; 5] = [None, Some(Role::Guest), Some(Role::User), Some(Role::Staff), Some(Role::Admin)];

// =============================================================================
// protected
// =============================================================================

#[test]
fn protected_pending_always_loading() {
    for role in ALL_ROLES {
        for require_staff in [false, true] {
            assert_eq!(protected(&pending_with(role), require_staff), RouteDecision::Loading, "{role:?}");
        }
    }
}

#[test]
fn protected_without_identity_redirects_to_entry() {
    let snap = snapshot_for(None);
    assert_eq!(protected(&snap, false), RouteDecision::redirect("/"));
    assert_eq!(protected(&snap, true), RouteDecision::redirect("/"));
}

#[test]
fn protected_staff_route_sends_guest_and_user_to_search() {
    for role in [Role::Guest, Role::User] {
        assert_eq!(protected(&snapshot_for(Some(role)), true), RouteDecision::redirect("/search"));
    }
}

#[test]
fn protected_staff_route_renders_for_staff_and_admin() {
    for role in [Role::Staff, Role::Admin] {
        assert_eq!(protected(&snapshot_for(Some(role)), true), RouteDecision::Render);
    }
}

#[test]
fn protected_open_route_renders_for_any_identity() {
    for role in [Role::Guest, Role::User, Role::Staff, Role::Admin] {
        assert_eq!(protected(&snapshot_for(Some(role)), false), RouteDecision::Render);
    }
}

#[test]
fn guards_are_pure() {
    let query = NavQuery::new([("mode", "login")]);
    for role in ALL_ROLES {
        let snap = snapshot_for(role);
        assert_eq!(protected(&snap, true), protected(&snap, true));
        assert_eq!(auth_page(&snap, &query), auth_page(&snap, &query));
    }
}

// =============================================================================
// auth_page
// =============================================================================

#[test]
fn auth_page_pending_is_loading() {
    for role in ALL_ROLES {
        assert_eq!(auth_page(&pending_with(role), &NavQuery::default()), RouteDecision::Loading);
    }
}

#[test]
fn auth_page_renders_for_anonymous_visitor() {
    assert_eq!(auth_page(&snapshot_for(None), &NavQuery::default()), RouteDecision::Render);
}

#[test]
fn auth_page_guest_escape_hatch() {
    let guest = snapshot_for(Some(Role::Guest));
    assert_eq!(auth_page(&guest, &NavQuery::new([("mode", "login")])), RouteDecision::Render);
    assert_eq!(auth_page(&guest, &NavQuery::default()), RouteDecision::redirect("/search"));
}

#[test]
fn auth_page_escape_hatch_requires_exact_mode() {
    let guest = snapshot_for(Some(Role::Guest));
    for mode in ["LOGIN", "forgot-password", "", "login "] {
        assert_eq!(auth_page(&guest, &NavQuery::new([("mode", mode)])), RouteDecision::redirect("/search"));
    }
}

#[test]
fn auth_page_escape_hatch_is_guest_only() {
    let query = NavQuery::new([("mode", "login")]);
    assert_eq!(auth_page(&snapshot_for(Some(Role::User)), &query), RouteDecision::redirect("/search"));
    assert_eq!(auth_page(&snapshot_for(Some(Role::Admin)), &query), RouteDecision::redirect("/admin/dashboard"));
}

#[test]
fn auth_page_sends_staff_to_dashboard() {
    for role in [Role::Staff, Role::Admin] {
        assert_eq!(
            auth_page(&snapshot_for(Some(role)), &NavQuery::default()),
            RouteDecision::redirect("/admin/dashboard")
        );
    }
}

// =============================================================================
// Redirect / NavQuery
// =============================================================================

#[test]
fn redirect_location_encodes_state() {
    let plain = Redirect::to("/search");
    assert_eq!(plain.location(), "/search");
    let tabbed = Redirect::with_state("/admin/dashboard", NavState { active_tab: "feedback".into() });
    assert_eq!(tabbed.location(), "/admin/dashboard?activeTab=feedback");
}

#[test]
fn nav_query_lookup() {
    let q = NavQuery::new([("mode", "login"), ("x", "1")]);
    assert_eq!(q.mode(), Some("login"));
    assert_eq!(q.get("x"), Some("1"));
    assert_eq!(q.get("y"), None);
    assert_eq!(NavQuery::default().mode(), None);
}

#[test]
fn decision_serializes_with_tag() {
    let v = serde_json::to_value(RouteDecision::redirect("/")).unwrap();
    assert_eq!(v["decision"], "redirect");
    assert_eq!(v["to"], "/");
    assert_eq!(serde_json::to_value(RouteDecision::Loading).unwrap()["decision"], "loading");
}
