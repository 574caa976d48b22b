//! Page plumbing: instance resolution, guard evaluation and the entry screens.
//!
//! Every page request resolves the browser's application instance, waits up
//! to `restore_wait` for its first identity resolution, and runs the route's
//! guard against the latest snapshot. Non-render decisions become the loading
//! placeholder or a redirect here, so page handlers only see renderable
//! visits. Form posts that arrive before the identity resolves are refused
//! with `503` and `Retry-After`, since a refreshed placeholder would drop the
//! submitted body.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use super::auth::{INSTANCE_COOKIE, SESSION_COOKIE, instance_cookie, sync_session_cookie};
use super::views::{self, EntryMode};
use crate::guard::{ENTRY_PATH, NavQuery, RouteDecision};
use crate::identity::IdentityContext;
use crate::identity::model::{Identity, IdentitySnapshot};
use crate::navigation::{Route, navigate};
use crate::state::AppState;

/// Seconds before the loading placeholder asks the browser to retry.
const LOADING_REFRESH_SECS: &str = "1";
/// Seconds a refused form post should wait before resubmitting.
const RETRY_AFTER_SECS: &str = "1";

pub type QueryParams = Result<Query<HashMap<String, String>>, QueryRejection>;

/// Malformed query strings are treated as empty.
pub fn nav_query(params: QueryParams) -> NavQuery {
    params.map(|Query(p)| NavQuery::new(p)).unwrap_or_default()
}

// =============================================================================
// INSTANCE + GUARD PLUMBING
// =============================================================================

/// Resolve (or open) this browser's instance and bring cookies in line.
pub(crate) async fn open_instance(
    state: &AppState,
    jar: CookieJar,
) -> (Arc<IdentityContext>, IdentitySnapshot, CookieJar) {
    let secure = state.config.cookie_secure;
    let instance_id = jar.get(INSTANCE_COOKIE).map(|c| c.value().to_owned());
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|t| !t.is_empty());

    let handle = state
        .instance(instance_id.as_deref(), token.as_deref())
        .await;
    let jar = if handle.created { jar.add(instance_cookie(handle.id, secure)) } else { jar };

    let snapshot = handle.ctx.wait_resolved(state.config.restore_wait).await;
    let jar = sync_session_cookie(jar, &snapshot, secure);
    (handle.ctx, snapshot, jar)
}

/// A request the guard allowed through.
pub(crate) struct Visit {
    pub ctx: Arc<IdentityContext>,
    pub snapshot: IdentitySnapshot,
    pub jar: CookieJar,
}

/// A request the guard allowed through with an identity attached.
pub(crate) struct Member {
    pub ctx: Arc<IdentityContext>,
    pub identity: Identity,
    pub jar: CookieJar,
}

/// Resolve the instance and apply `decide`; anything but `Render` is
/// answered directly.
pub(crate) async fn enter<F>(state: &AppState, jar: CookieJar, decide: F) -> Result<Visit, Response>
where
    F: FnOnce(&IdentitySnapshot) -> RouteDecision,
{
    admit(state, jar, decide, loading).await
}

/// Like `enter`, for guards that only render with an identity present.
pub(crate) async fn enter_member<F>(state: &AppState, jar: CookieJar, decide: F) -> Result<Member, Response>
where
    F: FnOnce(&IdentitySnapshot) -> RouteDecision,
{
    member(enter(state, jar, decide).await?)
}

/// `enter_member` for form posts: a pending identity is `503` rather than
/// the refreshing placeholder.
pub(crate) async fn enter_action<F>(state: &AppState, jar: CookieJar, decide: F) -> Result<Member, Response>
where
    F: FnOnce(&IdentitySnapshot) -> RouteDecision,
{
    member(admit(state, jar, decide, unavailable).await?)
}

async fn admit<F>(
    state: &AppState,
    jar: CookieJar,
    decide: F,
    pending: fn(CookieJar) -> Response,
) -> Result<Visit, Response>
where
    F: FnOnce(&IdentitySnapshot) -> RouteDecision,
{
    let (ctx, snapshot, jar) = open_instance(state, jar).await;
    match decide(&snapshot) {
        RouteDecision::Render => Ok(Visit { ctx, snapshot, jar }),
        RouteDecision::Loading => Err(pending(jar)),
        RouteDecision::Redirect(redirect) => Err((jar, Redirect::to(&redirect.location())).into_response()),
    }
}

fn member(visit: Visit) -> Result<Member, Response> {
    match visit.snapshot.identity {
        Some(identity) => Ok(Member { ctx: visit.ctx, identity, jar: visit.jar }),
        None => Err((visit.jar, Redirect::to(ENTRY_PATH)).into_response()),
    }
}

fn loading(jar: CookieJar) -> Response {
    (jar, [(header::REFRESH, LOADING_REFRESH_SECS)], Html(views::loading())).into_response()
}

fn unavailable(jar: CookieJar) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        jar,
        [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
        Html(views::not_ready()),
    )
        .into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /`: welcome, login and forgot-password screens.
pub async fn entry(State(state): State<AppState>, jar: CookieJar, params: QueryParams) -> Response {
    let query = nav_query(params);
    let visit = match enter(&state, jar, |s| navigate(s, &Route::Entry, &query)).await {
        Ok(visit) => visit,
        Err(resp) => return resp,
    };
    let mode = EntryMode::from_query(query.mode());
    (visit.jar, Html(views::entry(mode, visit.snapshot.identity.as_ref(), "", None))).into_response()
}

/// `GET /reset-password/{token}`: public.
pub async fn reset_password_page(Path(token): Path<String>) -> Html<String> {
    Html(views::reset_password(&token, None, false))
}

/// Routes whose only outcome is a redirect: `/login`, `/admin/feedback` and
/// anything unmatched.
pub async fn by_path(State(state): State<AppState>, jar: CookieJar, uri: Uri, params: QueryParams) -> Response {
    let query = nav_query(params);
    let path = uri.path();
    let route = Route::parse(path);
    match enter(&state, jar, |s| navigate(s, &route, &query)).await {
        Ok(visit) => {
            // A renderable route reached with a trailing slash.
            let canonical = path.trim_end_matches('/');
            let to = if canonical.is_empty() || canonical == path { ENTRY_PATH } else { canonical };
            (visit.jar, Redirect::to(to)).into_response()
        }
        Err(resp) => resp,
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
