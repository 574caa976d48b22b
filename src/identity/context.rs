//! Identity context: the single writer of one application instance's identity.
//!
//! DESIGN
//! ======
//! State lives in a `tokio::sync::watch` channel. Every mutation builds a
//! complete `IdentitySnapshot` and publishes it with one send, so guards
//! reading the channel observe either the old identity or the new one, never
//! a mix. Readers call `snapshot()` or hold a receiver from `subscribe()`.
//!
//! TRADE-OFFS
//! ==========
//! Auth calls are not serialized. Two `login` calls in flight race and the
//! last one to publish wins. Every publish swaps the snapshot atomically and
//! ends the session it displaced, so the losing session does not outlive
//! the race.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use super::model::{AuthError, AuthLoadingState, Identity, IdentitySnapshot};
use crate::services::auth::AuthService;
use crate::services::session_store::SessionRecord;

const MAX_HISTORY: usize = 50;

/// Visitor-scoped scratch data, discarded whenever the session changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scratch {
    pub bookmarks: Vec<String>,
    pub history: Vec<String>,
}

pub struct IdentityContext {
    auth: Arc<AuthService>,
    tx: watch::Sender<IdentitySnapshot>,
    scratch: Mutex<Scratch>,
}

impl IdentityContext {
    /// A fresh context in the `pending` state.
    #[must_use]
    pub fn new(auth: Arc<AuthService>) -> Self {
        let (tx, _rx) = watch::channel(IdentitySnapshot::pending());
        Self { auth, tx, scratch: Mutex::new(Scratch::default()) }
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> IdentitySnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.tx.borrow().identity.clone()
    }

    #[must_use]
    pub fn auth_loading_state(&self) -> AuthLoadingState {
        self.tx.borrow().loading
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.tx.borrow().is_staff()
    }

    /// Wait up to `timeout` for the first resolution, then return the latest
    /// snapshot whether or not it resolved.
    pub async fn wait_resolved(&self, timeout: Duration) -> IdentitySnapshot {
        let mut rx = self.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|s| !s.loading.is_pending())).await {
            Ok(Ok(snapshot)) => snapshot.clone(),
            _ => self.snapshot(),
        }
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Publish `next` and return the snapshot it replaced.
    fn publish(&self, mut next: IdentitySnapshot) -> IdentitySnapshot {
        self.tx.send_modify(|current| {
            next.generation = current.generation + 1;
            std::mem::swap(current, &mut next);
        });
        next
    }

    fn publish_record(&self, record: SessionRecord) -> IdentitySnapshot {
        self.publish(IdentitySnapshot::authenticated(record.identity, record.session))
    }

    /// Resolve the initial identity from a stored credential token.
    ///
    /// Only acts while `pending`; later calls are ignored. The pending check
    /// and the publish happen under one channel write, so a login or guest
    /// session that lands while the lookup is in flight is never overwritten.
    pub async fn restore(&self, token: Option<&str>) {
        if !self.auth_loading_state().is_pending() {
            return;
        }
        let restored = match token {
            None => None,
            Some(token) => match self.auth.restore(token).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(error = %e, "session restore failed; treating visitor as signed out");
                    None
                }
            },
        };

        let superseded = restored.as_ref().map(|r| r.session.token.clone());
        let role = restored.as_ref().map(|r| r.identity.role.as_str());
        let mut next = match restored {
            Some(record) => IdentitySnapshot::authenticated(record.identity, record.session),
            None => IdentitySnapshot::unauthenticated(),
        };
        let published = self.tx.send_if_modified(|current| {
            if !current.loading.is_pending() {
                return false;
            }
            next.generation = current.generation + 1;
            *current = next;
            true
        });

        match (published, superseded) {
            (true, _) => {
                if let Some(role) = role {
                    tracing::debug!(role, "identity restored");
                }
            }
            (false, Some(token)) => {
                // A login or guest session replaced the stored one mid-lookup.
                self.auth.end_session(&token).await;
            }
            (false, None) => {}
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the auth failure; prior state is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let before = self.snapshot();
        if !before.phase().can_login() {
            let role = before.identity.as_ref().map_or("unknown", |i| i.role.as_str());
            return Err(AuthError::IllegalTransition { action: "log in", role });
        }

        let record = match self.auth.login(email, password).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(kind = e.kind(), "login failed");
                return Err(e);
            }
        };
        let identity = record.identity.clone();
        tracing::info!(role = identity.role.as_str(), "login succeeded");

        let replaced = self.publish_record(record);
        *self.scratch.lock().await = Scratch::default();
        self.end_replaced(replaced).await;
        Ok(identity)
    }

    /// Start a new guest session, replacing any current guest session.
    ///
    /// # Errors
    ///
    /// Only `IllegalTransition` when an account is signed in; collaborator
    /// outages degrade to a local-only session instead.
    pub async fn continue_as_guest(&self) -> Result<Identity, AuthError> {
        let before = self.snapshot();
        if !before.phase().can_continue_as_guest() {
            let role = before.identity.as_ref().map_or("unknown", |i| i.role.as_str());
            return Err(AuthError::IllegalTransition { action: "continue as guest", role });
        }

        let record = self.auth.continue_as_guest().await;
        let identity = record.identity.clone();
        tracing::info!(local_only = record.session.is_local_only, "guest session started");

        let replaced = self.publish_record(record);
        *self.scratch.lock().await = Scratch::default();
        self.end_replaced(replaced).await;
        Ok(identity)
    }

    /// Clear the identity and destroy the session.
    pub async fn logout(&self) {
        let replaced = self.publish(IdentitySnapshot::unauthenticated());
        *self.scratch.lock().await = Scratch::default();
        if replaced.identity.is_some() {
            tracing::info!("logged out");
        }
        self.end_replaced(replaced).await;
    }

    /// End the session a publish displaced. Racing logins each end the one
    /// they replaced, so only the last writer's session survives.
    async fn end_replaced(&self, replaced: IdentitySnapshot) {
        if let Some(session) = replaced.session {
            self.auth.end_session(&session.token).await;
        }
    }

    // =========================================================================
    // SCRATCH DATA
    // =========================================================================

    pub async fn scratch(&self) -> Scratch {
        self.scratch.lock().await.clone()
    }

    /// Record a search query, newest first, without duplicates.
    pub async fn record_search(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let mut scratch = self.scratch.lock().await;
        scratch.history.retain(|q| q != query);
        scratch.history.insert(0, query.to_owned());
        scratch.history.truncate(MAX_HISTORY);
    }

    /// Add a bookmark; returns false when it was already present or blank.
    pub async fn add_bookmark(&self, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() {
            return false;
        }
        let mut scratch = self.scratch.lock().await;
        if scratch.bookmarks.iter().any(|b| b == item) {
            return false;
        }
        scratch.bookmarks.push(item.to_owned());
        true
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
