//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every screen is rendered server-side. GET pages run their route guard
//! against the browser's instance snapshot; form POSTs mutate the instance's
//! identity context and answer with a redirect or a re-rendered form.

pub mod admin;
pub mod auth;
pub mod feedback;
pub mod pages;
pub mod search;
pub mod views;

#[cfg(test)]
pub(crate) mod test_client;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::entry))
        .route("/login", get(pages::by_path))
        .route("/search", get(search::search_page))
        .route("/search/bookmarks", post(search::add_bookmark))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/feedback", get(pages::by_path))
        .route(
            "/admin/feedback/{id}",
            get(admin::feedback_detail).post(admin::review_feedback),
        )
        .route(
            "/feedback-form",
            get(feedback::feedback_form).post(feedback::submit_feedback),
        )
        .route(
            "/reset-password/{token}",
            get(pages::reset_password_page).post(auth::reset_password),
        )
        .route("/auth/login", post(auth::login))
        .route("/auth/guest", post(auth::continue_as_guest))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/api/identity", get(auth::me))
        .route("/healthz", get(healthz))
        .fallback(pages::by_path)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
