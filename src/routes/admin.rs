//! Admin dashboard and feedback review. Staff and admin only.

use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use super::feedback::{feedback_error_message, feedback_error_status};
use super::pages::{QueryParams, enter_action, enter_member, nav_query};
use super::views::{self, DashboardTab, Notice};
use crate::guard::{self, DASHBOARD_PATH, NavState, Redirect as GuardRedirect};
use crate::navigation::{FEEDBACK_TAB, Route, navigate};
use crate::services::backend::{FeedbackRecord, FeedbackReview};
use crate::services::feedback::{FeedbackError, review_from_record};
use crate::state::AppState;

/// `GET /admin/dashboard?activeTab=overview|feedback`
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar, params: QueryParams) -> Response {
    let query = nav_query(params);
    let member = match enter_member(&state, jar, |s| navigate(s, &Route::AdminDashboard, &query)).await {
        Ok(member) => member,
        Err(resp) => return resp,
    };
    let tab = DashboardTab::from_query(query.get("activeTab"));

    match state.feedback.list().await {
        Ok(records) => {
            let page = views::dashboard(&member.identity, tab, Ok(records.as_slice()));
            (member.jar, Html(page)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "feedback list failed");
            let notice = Notice::Error(feedback_error_message(&e));
            let page = views::dashboard(&member.identity, tab, Err(&notice));
            (feedback_error_status(&e), member.jar, Html(page)).into_response()
        }
    }
}

/// `GET /admin/feedback/{id}`
pub async fn feedback_detail(
    Path(id): Path<String>,
    State(state): State<AppState>,
    jar: CookieJar,
    params: QueryParams,
) -> Response {
    let query = nav_query(params);
    let route = Route::AdminFeedbackDetail(id.clone());
    let member = match enter_member(&state, jar, |s| navigate(s, &route, &query)).await {
        Ok(member) => member,
        Err(resp) => return resp,
    };

    match state.feedback.get(&id).await {
        Ok(record) => {
            let review = review_from_record(&record);
            let page = views::feedback_detail(&member.identity, &record, &review, None);
            (member.jar, Html(page)).into_response()
        }
        Err(e) => {
            if !matches!(e, FeedbackError::NotFound(_)) {
                tracing::error!(error = %e, feedback_id = %id, "feedback fetch failed");
            }
            let notice = Notice::Error(feedback_error_message(&e));
            let page = views::message("Feedback unavailable", Some(&member.identity), &notice);
            (feedback_error_status(&e), member.jar, Html(page)).into_response()
        }
    }
}

/// `POST /admin/feedback/{id}`: save review fields; all six are required.
pub async fn review_feedback(
    Path(id): Path<String>,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(review): Form<FeedbackReview>,
) -> Response {
    let member = match enter_action(&state, jar, |s| guard::protected(s, true)).await {
        Ok(member) => member,
        Err(resp) => return resp,
    };

    match state.feedback.review(&id, &review).await {
        Ok(()) => {
            let to = GuardRedirect::with_state(DASHBOARD_PATH, NavState { active_tab: FEEDBACK_TAB.to_owned() });
            (member.jar, Redirect::to(&to.location())).into_response()
        }
        Err(e @ FeedbackError::MissingFields(_)) => {
            // Re-render with what the reviewer typed.
            let record = state
                .feedback
                .get(&id)
                .await
                .unwrap_or_else(|_| FeedbackRecord { id: id.clone(), ..FeedbackRecord::default() });
            let notice = Notice::Error(feedback_error_message(&e));
            let page = views::feedback_detail(&member.identity, &record, &review, Some(&notice));
            (feedback_error_status(&e), member.jar, Html(page)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, feedback_id = %id, "feedback review failed");
            let notice = Notice::Error(feedback_error_message(&e));
            let page = views::message("Review not saved", Some(&member.identity), &notice);
            (feedback_error_status(&e), member.jar, Html(page)).into_response()
        }
    }
}
