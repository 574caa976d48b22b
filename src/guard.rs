//! Route guards: pure render-or-redirect decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Page handlers call these on every navigation with the instance's latest
//! `IdentitySnapshot`. Guards own no state and never fail; every input maps
//! to exactly one `RouteDecision`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::model::{Identity, IdentitySnapshot};

pub const ENTRY_PATH: &str = "/";
pub const SEARCH_PATH: &str = "/search";
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

// =============================================================================
// QUERY
// =============================================================================

/// Query parameters of the requested URL. Unknown keys are kept but ignored
/// by the guards; malformed input simply yields an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavQuery {
    params: BTreeMap<String, String>,
}

impl NavQuery {
    #[must_use]
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { params: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The entry-screen sub-mode (`mode=login`, `mode=forgot-password`).
    #[must_use]
    pub fn mode(&self) -> Option<&str> {
        self.get("mode")
    }

    fn wants_login_form(&self) -> bool {
        self.mode() == Some("login")
    }
}

// =============================================================================
// DECISION
// =============================================================================

/// Navigation state carried along with a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub active_tab: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: String,
    pub state: Option<NavState>,
}

impl Redirect {
    #[must_use]
    pub fn to(path: &str) -> Self {
        Self { to: path.to_owned(), state: None }
    }

    #[must_use]
    pub fn with_state(path: &str, state: NavState) -> Self {
        Self { to: path.to_owned(), state: Some(state) }
    }

    /// The `Location` value, with navigation state encoded in the query.
    #[must_use]
    pub fn location(&self) -> String {
        match &self.state {
            None => self.to.clone(),
            Some(state) => format!("{}?activeTab={}", self.to, state.active_tab),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum RouteDecision {
    /// Identity still resolving: show the neutral placeholder.
    Loading,
    /// Show the requested screen.
    Render,
    Redirect(Redirect),
}

impl RouteDecision {
    #[must_use]
    pub fn redirect(path: &str) -> Self {
        Self::Redirect(Redirect::to(path))
    }
}

// =============================================================================
// GUARDS
// =============================================================================

/// Gate for screens that need an identity (and optionally a staff role).
#[must_use]
pub fn protected(snapshot: &IdentitySnapshot, require_staff: bool) -> RouteDecision {
    if snapshot.loading.is_pending() {
        return RouteDecision::Loading;
    }
    let Some(identity) = snapshot.identity.as_ref() else {
        return RouteDecision::redirect(ENTRY_PATH);
    };
    if require_staff && !identity.is_staff() {
        return RouteDecision::redirect(SEARCH_PATH);
    }
    RouteDecision::Render
}

/// Inverse gate for the entry screen: identified visitors are sent onward,
/// except a guest explicitly asking for the login form.
#[must_use]
pub fn auth_page(snapshot: &IdentitySnapshot, query: &NavQuery) -> RouteDecision {
    if snapshot.loading.is_pending() {
        return RouteDecision::Loading;
    }
    let Some(identity) = snapshot.identity.as_ref() else {
        return RouteDecision::Render;
    };
    if identity.is_guest() && query.wants_login_form() {
        return RouteDecision::Render;
    }
    RouteDecision::redirect(home_for(identity))
}

/// Where an identified visitor lands after sign-in.
#[must_use]
pub fn home_for(identity: &Identity) -> &'static str {
    if identity.is_staff() { DASHBOARD_PATH } else { SEARCH_PATH }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
