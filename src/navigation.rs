//! Navigation surface: the route table and which guard covers each route.
//!
//! `navigate` is total: any path plus any snapshot yields one decision.

use crate::guard::{self, DASHBOARD_PATH, ENTRY_PATH, NavQuery, NavState, Redirect, RouteDecision};
use crate::identity::model::IdentitySnapshot;

pub const FEEDBACK_TAB: &str = "feedback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: welcome, login and forgot-password sub-modes.
    Entry,
    /// `/login`: legacy alias for the entry screen.
    LoginAlias,
    Search,
    AdminDashboard,
    /// `/admin/feedback`: shortcut to the dashboard's feedback tab.
    AdminFeedback,
    AdminFeedbackDetail(String),
    FeedbackForm,
    ResetPassword(String),
    NotFound,
}

/// Which gate a route sits behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    None,
    AuthPage,
    Protected { require_staff: bool },
}

impl Route {
    /// Match a request path. One trailing slash is tolerated.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = if path.len() > 1 { path.strip_suffix('/').unwrap_or(path) } else { path };
        let segments: Vec<&str> = path.split('/').skip(1).collect();
        match segments.as_slice() {
            [""] => Self::Entry,
            ["login"] => Self::LoginAlias,
            ["search"] => Self::Search,
            ["admin", "dashboard"] => Self::AdminDashboard,
            ["admin", "feedback"] => Self::AdminFeedback,
            ["admin", "feedback", id] if !id.is_empty() => Self::AdminFeedbackDetail((*id).to_owned()),
            ["feedback-form"] => Self::FeedbackForm,
            ["reset-password", token] if !token.is_empty() => Self::ResetPassword((*token).to_owned()),
            _ => Self::NotFound,
        }
    }

    #[must_use]
    pub fn gate(&self) -> Gate {
        match self {
            Self::Entry => Gate::AuthPage,
            Self::Search | Self::FeedbackForm => Gate::Protected { require_staff: false },
            Self::AdminDashboard | Self::AdminFeedback | Self::AdminFeedbackDetail(_) => {
                Gate::Protected { require_staff: true }
            }
            Self::LoginAlias | Self::ResetPassword(_) | Self::NotFound => Gate::None,
        }
    }
}

/// Decide what to do with a navigation to `route`.
#[must_use]
pub fn navigate(snapshot: &IdentitySnapshot, route: &Route, query: &NavQuery) -> RouteDecision {
    let decision = match route.gate() {
        Gate::None => RouteDecision::Render,
        Gate::AuthPage => guard::auth_page(snapshot, query),
        Gate::Protected { require_staff } => guard::protected(snapshot, require_staff),
    };
    if decision != RouteDecision::Render {
        return decision;
    }

    match route {
        Route::LoginAlias | Route::NotFound => RouteDecision::redirect(ENTRY_PATH),
        Route::AdminFeedback => RouteDecision::Redirect(Redirect::with_state(
            DASHBOARD_PATH,
            NavState { active_tab: FEEDBACK_TAB.to_owned() },
        )),
        _ => RouteDecision::Render,
    }
}

#[cfg(test)]
#[path = "navigation_test.rs"]
mod tests;
