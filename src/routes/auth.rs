//! Auth routes: login, guest sessions, logout, password reset, identity JSON.
//!
//! Two cookies tie a browser to its state. `litpath_instance` names the
//! application instance and lives for the browser session; `litpath_session`
//! carries the session credential token so a new instance can restore.

use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use super::pages::open_instance;
use super::views::{self, EntryMode, Notice};
use crate::guard::{ENTRY_PATH, SEARCH_PATH, home_for};
use crate::identity::model::{AuthError, IdentitySnapshot};
use crate::services::auth::validate_new_password;
use crate::services::session_store::SESSION_TTL;
use crate::state::AppState;

pub const INSTANCE_COOKIE: &str = "litpath_instance";
pub const SESSION_COOKIE: &str = "litpath_session";

// =============================================================================
// COOKIES
// =============================================================================

pub(crate) fn instance_cookie(id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((INSTANCE_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_TTL)
        .build()
}

fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Make the session cookie match the snapshot's session. Pending snapshots
/// leave the cookie alone.
pub(crate) fn sync_session_cookie(jar: CookieJar, snapshot: &IdentitySnapshot, secure: bool) -> CookieJar {
    if snapshot.loading.is_pending() {
        return jar;
    }
    let current = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty());
    match (snapshot.session.as_ref(), current) {
        (Some(session), Some(current)) if session.token == current => jar,
        (Some(session), _) => jar.add(session_cookie(session.token.clone(), secure)),
        (None, Some(_)) => jar.add(cleared_session_cookie(secure)),
        (None, None) => jar,
    }
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

pub(crate) fn auth_error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Network(_) | AuthError::Server(_) => StatusCode::BAD_GATEWAY,
        AuthError::PersistenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::IllegalTransition { .. } => StatusCode::CONFLICT,
    }
}

fn auth_error_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Invalid email or password.".to_owned(),
        AuthError::Network(_) => "Cannot reach the LitPath server. Check your connection and try again.".to_owned(),
        AuthError::Server(_) | AuthError::PersistenceUnavailable(_) => {
            "Something went wrong on our side. Please try again.".to_owned()
        }
        AuthError::IllegalTransition { role, .. } => {
            format!("You are signed in as {role}. Log out before switching accounts.")
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// `POST /auth/login`: sign in, then go where the entry guard sends the new
/// identity.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let (ctx, _, jar) = open_instance(&state, jar).await;
    match ctx.login(&form.email, &form.password).await {
        Ok(identity) => {
            let jar = sync_session_cookie(jar, &ctx.snapshot(), state.config.cookie_secure);
            (jar, Redirect::to(home_for(&identity))).into_response()
        }
        Err(e) => {
            let notice = Notice::Error(auth_error_message(&e));
            let current = ctx.current_identity();
            let page = views::entry(EntryMode::Login, current.as_ref(), form.email.trim(), Some(&notice));
            (auth_error_status(&e), jar, Html(page)).into_response()
        }
    }
}

/// `POST /auth/guest`: start a fresh guest session.
pub async fn continue_as_guest(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (ctx, _, jar) = open_instance(&state, jar).await;
    match ctx.continue_as_guest().await {
        Ok(_) => {
            let jar = sync_session_cookie(jar, &ctx.snapshot(), state.config.cookie_secure);
            (jar, Redirect::to(SEARCH_PATH)).into_response()
        }
        Err(e) => {
            let notice = Notice::Error(auth_error_message(&e));
            let page = views::message("Cannot start a guest session", ctx.current_identity().as_ref(), &notice);
            (auth_error_status(&e), jar, Html(page)).into_response()
        }
    }
}

/// `POST /auth/logout`: end the session and clear the session cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (ctx, _, jar) = open_instance(&state, jar).await;
    ctx.logout().await;
    let jar = sync_session_cookie(jar, &ctx.snapshot(), state.config.cookie_secure);
    (jar, Redirect::to(ENTRY_PATH)).into_response()
}

#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    email: String,
}

/// `POST /auth/forgot-password`: ask the backend to email a reset link.
pub async fn forgot_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let (_, snapshot, jar) = open_instance(&state, jar).await;
    let email = form.email.trim();
    let (status, notice) = match state.auth.request_password_reset(email).await {
        Ok(message) => (StatusCode::OK, Notice::Info(message)),
        Err(AuthError::InvalidCredentials) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Notice::Error("Enter a valid email address.".to_owned()))
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), "password reset request failed");
            (auth_error_status(&e), Notice::Error(auth_error_message(&e)))
        }
    };
    let page = views::entry(EntryMode::ForgotPassword, snapshot.identity.as_ref(), email, Some(&notice));
    (status, jar, Html(page)).into_response()
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm: String,
}

/// `POST /reset-password/{token}`: set a new password.
pub async fn reset_password(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    if let Err(msg) = validate_new_password(&form.password, &form.confirm) {
        let page = views::reset_password(&token, Some(&Notice::Error(msg.to_owned())), false);
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
    }

    match state.auth.reset_password(&token, &form.password).await {
        Ok(message) => {
            tracing::info!("password reset completed");
            Html(views::reset_password(&token, Some(&Notice::Info(message)), true)).into_response()
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), "password reset failed");
            let msg = match &e {
                AuthError::InvalidCredentials => "This reset link is invalid or has expired.".to_owned(),
                other => auth_error_message(other),
            };
            let page = views::reset_password(&token, Some(&Notice::Error(msg)), false);
            (auth_error_status(&e), Html(page)).into_response()
        }
    }
}

/// Snapshot view returned by `GET /api/identity`.
#[derive(Serialize)]
pub struct IdentityView {
    #[serde(flatten)]
    snapshot: IdentitySnapshot,
    is_staff: bool,
}

/// `GET /api/identity`: the instance's current identity snapshot.
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (ctx, snapshot, jar) = open_instance(&state, jar).await;
    let is_staff = ctx.is_staff();
    (jar, Json(IdentityView { snapshot, is_staff })).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
