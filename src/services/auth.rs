//! Auth service: credential checks, guest sessions and password resets.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sits between the identity context and the REST backend. Backend results
//! are normalized into `Identity` / `AuthError` here so nothing above this
//! layer sees wire types.

use std::sync::Arc;

use uuid::Uuid;

use crate::identity::model::{AuthError, Identity, Role};
use crate::services::backend::{AuthBackend, BackendError, BackendUser};
use crate::services::session_store::{PersistenceError, SessionRecord, SessionStore};

pub const MIN_PASSWORD_LEN: usize = 8;

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

fn name_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("user")
        .to_owned()
}

/// Build an account identity from a backend user record.
#[must_use]
pub fn identity_from_backend(user: BackendUser, login_email: &str) -> Identity {
    let email = user.email.or_else(|| Some(login_email.to_owned()));
    let display_name = user
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| name_from_email(email.as_deref().unwrap_or(login_email)));
    Identity { id: user.id, role: Role::from_backend(user.role.as_deref()), display_name, email }
}

/// Statuses the backend uses to reject credentials or tokens.
const REJECTED_STATUSES: [u16; 3] = [400, 401, 403];

/// Classify a backend failure for the caller. Only outright rejections count
/// as bad credentials; rate limits and other 4xx answers are server errors.
#[must_use]
pub fn backend_error_to_auth(err: BackendError) -> AuthError {
    match err {
        BackendError::Network(msg) => AuthError::Network(msg),
        BackendError::Status { status, .. } if REJECTED_STATUSES.contains(&status) => AuthError::InvalidCredentials,
        BackendError::Status { status, body } => AuthError::Server(format!("{status}: {body}")),
        BackendError::Decode(msg) | BackendError::InvalidUrl(msg) => AuthError::Server(msg),
    }
}

pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, sessions: Arc<SessionStore>) -> Self {
        Self { backend, sessions }
    }

    /// Verify credentials and open an authenticated session.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for malformed emails or rejected logins,
    /// `Network`/`Server` when the backend cannot answer.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionRecord, AuthError> {
        let Some(email) = normalize_email(email) else {
            return Err(AuthError::InvalidCredentials);
        };
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let resp = self
            .backend
            .login(&email, password)
            .await
            .map_err(backend_error_to_auth)?;
        if !resp.success {
            tracing::debug!(reason = resp.error.as_deref().unwrap_or(""), "backend rejected login");
            return Err(AuthError::InvalidCredentials);
        }
        let Some(user) = resp.user else {
            return Err(AuthError::Server("login succeeded without a user record".to_owned()));
        };

        let identity = identity_from_backend(user, &email);
        Ok(self.sessions.create_authenticated(identity).await)
    }

    /// Open an anonymous session. Never fails: any collaborator outage
    /// degrades to a local-only session.
    pub async fn continue_as_guest(&self) -> SessionRecord {
        let (session_id, force_local) = match self.backend.create_guest_session().await {
            Ok(grant) => (grant.session_id, grant.is_local_only.unwrap_or(false)),
            Err(e) => {
                tracing::warn!(error = %e, "guest-session-create failed; issuing local-only guest session");
                (Uuid::new_v4().to_string(), true)
            }
        };
        self.sessions
            .create_anonymous(session_id, force_local)
            .await
    }

    /// Resolve a stored credential token.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote session table cannot be read.
    pub async fn restore(&self, token: &str) -> Result<Option<SessionRecord>, PersistenceError> {
        self.sessions.restore(token).await
    }

    pub async fn end_session(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }

    /// Forget local session records older than `max_age`.
    pub async fn prune_sessions(&self, max_age: time::Duration) -> usize {
        self.sessions.prune_expired(max_age).await
    }

    /// Ask the backend to email a reset link.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for malformed emails, `Network`/`Server` otherwise.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let email = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;
        let resp = self
            .backend
            .request_password_reset(&email)
            .await
            .map_err(|e| match e {
                BackendError::Network(msg) => AuthError::Network(msg),
                other => AuthError::Server(other.to_string()),
            })?;
        Ok(resp
            .message
            .unwrap_or_else(|| "If that email is registered, a reset link is on its way.".to_owned()))
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` when the backend rejects the token,
    /// `Network`/`Server` when it cannot answer.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError> {
        let resp = self
            .backend
            .reset_password(token, new_password)
            .await
            .map_err(backend_error_to_auth)?;
        if !resp.success {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(resp
            .message
            .unwrap_or_else(|| "Password updated. You can now log in.".to_owned()))
    }
}

/// Check a new password and its confirmation before calling the backend.
///
/// # Errors
///
/// Returns a user-facing message describing the first problem found.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters.");
    }
    if password != confirm {
        return Err("Passwords do not match.");
    }
    Ok(())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
