//! REST backend client: login, guest sessions, password reset, feedback CRUD.
//!
//! ARCHITECTURE
//! ============
//! The backend is an external collaborator. Two `async_trait` seams,
//! `AuthBackend` and `FeedbackBackend`, keep services testable with in-memory
//! mocks; `HttpBackend` implements both over `reqwest`.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures become `BackendError::Network`, non-success statuses
//! `BackendError::Status`, and undecodable bodies `BackendError::Decode`.
//! Services decide what each means for the user.

use std::time::Duration;

use reqwest::Url;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Network(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected backend response: {0}")]
    Decode(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Account record returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendUser {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    #[serde(default, alias = "full_name", alias = "username", alias = "displayName")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<BackendUser>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSessionGrant {
    pub session_id: String,
    #[serde(default = "default_true")]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_local_only: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// CSM feedback entry as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub rating: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub admin_category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub is_valid: Option<String>,
    #[serde(default)]
    pub validity_remarks: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub is_doable: Option<String>,
    #[serde(default)]
    pub feasibility_remarks: Option<String>,
}

/// Admin review fields sent in a feedback PATCH.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReview {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub admin_category: String,
    #[serde(default)]
    pub is_valid: String,
    #[serde(default)]
    pub validity_remarks: String,
    #[serde(default)]
    pub is_doable: String,
    #[serde(default)]
    pub feasibility_remarks: String,
}

/// New feedback entry posted from the feedback form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackSubmission {
    pub rating: u8,
    pub comment: String,
    pub submitted_by: String,
    pub is_guest: bool,
}

fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("expected string or number")),
    }
}

/// Accept strings, numbers and booleans; store their textual form.
fn deserialize_opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(if b { "yes" } else { "no" }.to_owned())),
        Some(_) => Err(D::Error::custom("expected scalar")),
    }
}

// =============================================================================
// TRAITS
// =============================================================================

#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, BackendError>;
    async fn create_guest_session(&self) -> Result<GuestSessionGrant, BackendError>;
    async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, BackendError>;
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<PasswordResetResponse, BackendError>;
}

#[async_trait::async_trait]
pub trait FeedbackBackend: Send + Sync {
    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, BackendError>;
    async fn get_feedback(&self, id: &str) -> Result<Option<FeedbackRecord>, BackendError>;
    async fn patch_feedback(&self, id: &str, review: &FeedbackReview) -> Result<(), BackendError>;
    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<(), BackendError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    base: Url,
}

impl HttpBackend {
    /// Build a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// underlying HTTP client fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let base = Url::parse(&base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("litpath")
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(Self { http, base_url, base })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `/api/feedback/{id}` with the id percent-encoded as one path segment.
    fn feedback_url(&self, id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "feedback", id]);
        }
        url
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        req.send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(BackendError::Status { status: status.as_u16(), body });
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(format!("{e}: {body}")))
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, BackendError> {
        let req = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let resp = self.send(req).await?;

        // Rejected credentials come back as 400/401 with a regular login body.
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            return Ok(serde_json::from_str(&body).unwrap_or(LoginResponse {
                success: false,
                user: None,
                error: Some(body),
            }));
        }
        Self::decode(resp).await
    }

    async fn create_guest_session(&self) -> Result<GuestSessionGrant, BackendError> {
        let req = self.http.post(self.url("/api/auth/guest-session"));
        Self::decode(self.send(req).await?).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, BackendError> {
        let req = self
            .http
            .post(self.url("/api/auth/password-reset-request"))
            .json(&serde_json::json!({ "email": email }));
        Self::decode(self.send(req).await?).await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<PasswordResetResponse, BackendError> {
        let req = self
            .http
            .post(self.url("/api/auth/password-reset"))
            .json(&serde_json::json!({ "token": token, "newPassword": new_password }));
        Self::decode(self.send(req).await?).await
    }
}

#[async_trait::async_trait]
impl FeedbackBackend for HttpBackend {
    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, BackendError> {
        let req = self.http.get(self.url("/api/feedback"));
        Self::decode(self.send(req).await?).await
    }

    async fn get_feedback(&self, id: &str) -> Result<Option<FeedbackRecord>, BackendError> {
        let req = self.http.get(self.feedback_url(id));
        let resp = self.send(req).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(resp).await.map(Some)
    }

    async fn patch_feedback(&self, id: &str, review: &FeedbackReview) -> Result<(), BackendError> {
        let req = self.http.patch(self.feedback_url(id)).json(review);
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(())
    }

    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<(), BackendError> {
        let req = self.http.post(self.url("/api/feedback")).json(submission);
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
