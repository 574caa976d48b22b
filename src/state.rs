//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the services and a registry of live application instances, one per
//! browser, each owning its own `IdentityContext`. A new instance starts
//! `pending` and restores its identity from the session cookie in the
//! background, so page handlers never block on the session table for longer
//! than `restore_wait`.
//!
//! The registry holds at most `max_instances` entries. Opening one more evicts
//! the least recently seen instance; its browser restores from the session
//! cookie on the next request.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::identity::IdentityContext;
use crate::services::auth::AuthService;
use crate::services::backend::{AuthBackend, FeedbackBackend};
use crate::services::feedback::FeedbackService;
use crate::services::session_store::{SessionStore, generate_token};

// =============================================================================
// INSTANCE
// =============================================================================

/// Registry entry for one browser's application instance.
pub struct InstanceEntry {
    pub ctx: Arc<IdentityContext>,
    pub last_seen: Instant,
}

/// Result of resolving the instance cookie.
pub struct InstanceHandle {
    pub id: String,
    pub ctx: Arc<IdentityContext>,
    /// True when a new instance was opened and its cookie must be set.
    pub created: bool,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub feedback: Arc<FeedbackService>,
    pub instances: Arc<RwLock<HashMap<String, InstanceEntry>>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        auth_backend: Arc<dyn AuthBackend>,
        feedback_backend: Arc<dyn FeedbackBackend>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(AuthService::new(auth_backend, Arc::new(sessions))),
            feedback: Arc::new(FeedbackService::new(feedback_backend)),
            instances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up the instance named by the browser's instance cookie, or open a
    /// new one that restores from `session_token` in the background.
    pub async fn instance(&self, instance_id: Option<&str>, session_token: Option<&str>) -> InstanceHandle {
        let mut instances = self.instances.write().await;
        if let Some(id) = instance_id
            && let Some(entry) = instances.get_mut(id)
        {
            entry.last_seen = Instant::now();
            return InstanceHandle { id: id.to_owned(), ctx: entry.ctx.clone(), created: false };
        }

        if instances.len() >= self.config.max_instances {
            let stalest = instances
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(stalest) = stalest {
                instances.remove(&stalest);
                tracing::debug!(max = self.config.max_instances, "instance registry full; evicted stalest instance");
            }
        }

        let id = generate_token();
        let ctx = Arc::new(IdentityContext::new(self.auth.clone()));
        instances.insert(id.clone(), InstanceEntry { ctx: ctx.clone(), last_seen: Instant::now() });
        drop(instances);
        tracing::debug!(restoring = session_token.is_some(), "opened application instance");

        let restoring = ctx.clone();
        let token = session_token.map(str::to_owned);
        tokio::spawn(async move {
            restoring.restore(token.as_deref()).await;
        });

        InstanceHandle { id, ctx, created: true }
    }

    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
