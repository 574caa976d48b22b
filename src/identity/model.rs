//! Identity, session and loading-state types shared by the auth core.
//!
//! DESIGN
//! ======
//! `IdentitySnapshot` is the unit of publication: the context replaces the
//! whole snapshot on every mutation so readers never see a new `id` paired
//! with a stale `role`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Staff,
    Admin,
}

impl Role {
    /// Map a backend-provided role string onto an account role.
    ///
    /// Unknown values become `User`. `guest` is not accepted here: guest
    /// identities only come from guest-session creation.
    #[must_use]
    pub fn from_backend(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("admin") => Self::Admin,
            Some("staff") => Self::Staff,
            _ => Self::User,
        }
    }

    #[must_use]
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// The subject currently using an application instance.
///
/// For guests `id` is the ephemeral session id, never an account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub role: Role,
    pub display_name: String,
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn guest(session_id: &str) -> Self {
        Self { id: session_id.to_owned(), role: Role::Guest, display_name: "Guest".to_owned(), email: None }
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.role == Role::Guest
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Binds one application instance to an identity.
///
/// `session_id` is the public handle (a guest's identity id); `token` is the
/// secret credential kept in the browser cookie and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(skip)]
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_anonymous: bool,
    pub is_local_only: bool,
}

impl Session {
    #[must_use]
    pub fn new(session_id: String, token: String, is_anonymous: bool) -> Self {
        Self { session_id, token, created_at: OffsetDateTime::now_utc(), is_anonymous, is_local_only: false }
    }
}

// =============================================================================
// LOADING STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthLoadingState {
    Pending,
    ResolvedAuthenticated,
    ResolvedUnauthenticated,
}

impl AuthLoadingState {
    #[must_use]
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

// =============================================================================
// LIFECYCLE PHASE
// =============================================================================

/// Coarse lifecycle position used to validate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unresolved,
    Guest,
    Authenticated(Role),
}

impl Phase {
    #[must_use]
    pub fn of(identity: Option<&Identity>) -> Self {
        match identity {
            None => Self::Unresolved,
            Some(id) if id.is_guest() => Self::Guest,
            Some(id) => Self::Authenticated(id.role),
        }
    }

    /// `login` is legal from no identity or from a guest identity.
    #[must_use]
    pub fn can_login(self) -> bool {
        matches!(self, Self::Unresolved | Self::Guest)
    }

    /// A new guest session may start from nothing or replace a guest session.
    #[must_use]
    pub fn can_continue_as_guest(self) -> bool {
        matches!(self, Self::Unresolved | Self::Guest)
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Everything a guard needs to decide, published as one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentitySnapshot {
    pub loading: AuthLoadingState,
    pub identity: Option<Identity>,
    pub session: Option<Session>,
    /// Bumped on every publish.
    pub generation: u64,
}

impl IdentitySnapshot {
    #[must_use]
    pub fn pending() -> Self {
        Self { loading: AuthLoadingState::Pending, identity: None, session: None, generation: 0 }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { loading: AuthLoadingState::ResolvedUnauthenticated, identity: None, session: None, generation: 0 }
    }

    #[must_use]
    pub fn authenticated(identity: Identity, session: Session) -> Self {
        Self {
            loading: AuthLoadingState::ResolvedAuthenticated,
            identity: Some(identity),
            session: Some(session),
            generation: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        Phase::of(self.identity.as_ref())
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_staff)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("network error: {0}")]
    Network(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("session persistence unavailable: {0}")]
    PersistenceUnavailable(String),
    #[error("cannot {action} while signed in as {role}")]
    IllegalTransition { action: &'static str, role: &'static str },
}

impl AuthError {
    /// Stable kebab-case tag used in logs and JSON responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid-credentials",
            Self::Network(_) => "network-error",
            Self::Server(_) => "server-error",
            Self::PersistenceUnavailable(_) => "persistence-unavailable",
            Self::IllegalTransition { .. } => "illegal-transition",
        }
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
