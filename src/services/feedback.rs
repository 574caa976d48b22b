//! CSM feedback service: submission from the feedback form and admin review.
//!
//! Review patches are only sent once every review field is filled in.

use std::sync::Arc;

use crate::identity::model::Identity;
use crate::services::backend::{BackendError, FeedbackBackend, FeedbackRecord, FeedbackReview, FeedbackSubmission};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error("comment is too long")]
    CommentTooLong,
    #[error("feedback {0} not found")]
    NotFound(String),
    #[error("backend unreachable: {0}")]
    Network(String),
    #[error("backend error: {0}")]
    Server(String),
}

impl From<BackendError> for FeedbackError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Network(msg) => Self::Network(msg),
            other => Self::Server(other.to_string()),
        }
    }
}

/// Names of review fields that are blank after trimming.
#[must_use]
pub fn missing_review_fields(review: &FeedbackReview) -> Vec<&'static str> {
    [
        ("status", &review.status),
        ("admin_category", &review.admin_category),
        ("is_valid", &review.is_valid),
        ("validity_remarks", &review.validity_remarks),
        ("is_doable", &review.is_doable),
        ("feasibility_remarks", &review.feasibility_remarks),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
}

fn trimmed(review: &FeedbackReview) -> FeedbackReview {
    FeedbackReview {
        status: review.status.trim().to_owned(),
        admin_category: review.admin_category.trim().to_owned(),
        is_valid: review.is_valid.trim().to_owned(),
        validity_remarks: review.validity_remarks.trim().to_owned(),
        is_doable: review.is_doable.trim().to_owned(),
        feasibility_remarks: review.feasibility_remarks.trim().to_owned(),
    }
}

/// Prefill a review form from a stored record.
#[must_use]
pub fn review_from_record(record: &FeedbackRecord) -> FeedbackReview {
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    FeedbackReview {
        status: field(&record.status),
        admin_category: field(&record.admin_category),
        is_valid: field(&record.is_valid),
        validity_remarks: field(&record.validity_remarks),
        is_doable: field(&record.is_doable),
        feasibility_remarks: field(&record.feasibility_remarks),
    }
}

/// Parse a form rating value into the accepted range.
///
/// # Errors
///
/// Returns `InvalidRating` for non-numeric or out-of-range values.
pub fn parse_rating(raw: &str) -> Result<u8, FeedbackError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or(FeedbackError::InvalidRating)
}

pub struct FeedbackService {
    backend: Arc<dyn FeedbackBackend>,
}

/// Empty and dot-segment ids cannot name a single backend record.
fn addressable(id: &str) -> bool {
    !matches!(id.trim(), "" | "." | "..")
}

impl FeedbackService {
    #[must_use]
    pub fn new(backend: Arc<dyn FeedbackBackend>) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// Returns an error if the backend cannot list feedback.
    pub async fn list(&self) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        Ok(self.backend.list_feedback().await?)
    }

    /// # Errors
    ///
    /// `NotFound` when the backend has no such record.
    pub async fn get(&self, id: &str) -> Result<FeedbackRecord, FeedbackError> {
        if !addressable(id) {
            return Err(FeedbackError::NotFound(id.to_owned()));
        }
        self.backend
            .get_feedback(id)
            .await?
            .ok_or_else(|| FeedbackError::NotFound(id.to_owned()))
    }

    /// Validate and send an admin review.
    ///
    /// # Errors
    ///
    /// `NotFound` for an id that cannot name a record, `MissingFields` lists
    /// every blank field; backend failures otherwise.
    pub async fn review(&self, id: &str, review: &FeedbackReview) -> Result<(), FeedbackError> {
        if !addressable(id) {
            return Err(FeedbackError::NotFound(id.to_owned()));
        }
        let missing = missing_review_fields(review);
        if !missing.is_empty() {
            return Err(FeedbackError::MissingFields(missing));
        }
        self.backend.patch_feedback(id, &trimmed(review)).await?;
        tracing::info!(feedback_id = %id, "feedback review saved");
        Ok(())
    }

    /// Submit a feedback entry on behalf of the current visitor.
    ///
    /// # Errors
    ///
    /// `InvalidRating`/`CommentTooLong` for bad input; backend failures otherwise.
    pub async fn submit(&self, author: &Identity, rating: u8, comment: &str) -> Result<(), FeedbackError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(FeedbackError::InvalidRating);
        }
        let comment = comment.trim();
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(FeedbackError::CommentTooLong);
        }
        let submission = FeedbackSubmission {
            rating,
            comment: comment.to_owned(),
            submitted_by: author.id.clone(),
            is_guest: author.is_guest(),
        };
        self.backend.submit_feedback(&submission).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "feedback_test.rs"]
mod tests;
