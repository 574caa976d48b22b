//! CSM feedback form.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::pages::{QueryParams, enter_action, enter_member, nav_query};
use super::views::{self, Notice};
use crate::guard;
use crate::navigation::{Route, navigate};
use crate::services::feedback::{FeedbackError, MAX_COMMENT_LEN, MAX_RATING, MIN_RATING, parse_rating};
use crate::state::AppState;

pub(crate) fn feedback_error_status(err: &FeedbackError) -> StatusCode {
    match err {
        FeedbackError::MissingFields(_) | FeedbackError::InvalidRating | FeedbackError::CommentTooLong => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        FeedbackError::NotFound(_) => StatusCode::NOT_FOUND,
        FeedbackError::Network(_) | FeedbackError::Server(_) => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn feedback_error_message(err: &FeedbackError) -> String {
    match err {
        FeedbackError::MissingFields(fields) => format!("Please fill in: {}.", fields.join(", ")),
        FeedbackError::InvalidRating => format!("Choose a rating from {MIN_RATING} to {MAX_RATING}."),
        FeedbackError::CommentTooLong => format!("Comments are limited to {MAX_COMMENT_LEN} characters."),
        FeedbackError::NotFound(_) => "That feedback entry no longer exists.".to_owned(),
        FeedbackError::Network(_) | FeedbackError::Server(_) => {
            "Feedback is unavailable right now. Please try again later.".to_owned()
        }
    }
}

/// `GET /feedback-form`
pub async fn feedback_form(State(state): State<AppState>, jar: CookieJar, params: QueryParams) -> Response {
    let query = nav_query(params);
    match enter_member(&state, jar, |s| navigate(s, &Route::FeedbackForm, &query)).await {
        Ok(member) => (member.jar, Html(views::feedback_form(&member.identity, None))).into_response(),
        Err(resp) => resp,
    }
}

#[derive(Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    rating: String,
    #[serde(default)]
    comment: String,
}

/// `POST /feedback-form`
pub async fn submit_feedback(State(state): State<AppState>, jar: CookieJar, Form(form): Form<FeedbackForm>) -> Response {
    let member = match enter_action(&state, jar, |s| guard::protected(s, false)).await {
        Ok(member) => member,
        Err(resp) => return resp,
    };

    let result = match parse_rating(&form.rating) {
        Ok(rating) => state.feedback.submit(&member.identity, rating, &form.comment).await,
        Err(e) => Err(e),
    };
    let (status, notice) = match result {
        Ok(()) => (StatusCode::OK, Notice::Info("Thank you for your feedback!".to_owned())),
        Err(e) => {
            tracing::warn!(error = %e, "feedback submission rejected");
            (feedback_error_status(&e), Notice::Error(feedback_error_message(&e)))
        }
    };
    (status, member.jar, Html(views::feedback_form(&member.identity, Some(&notice)))).into_response()
}
