//! Instance sweeper: drops application instances nobody has touched lately.
//!
//! DESIGN
//! ======
//! A background task wakes every `SWEEP_INTERVAL`, collects idle instance
//! ids under the registry lock, and removes them. Sessions are untouched, so
//! a returning browser restores its identity from the session cookie into a
//! fresh instance. The same pass forgets local session records older than
//! `SESSION_TTL`, the lifetime of the session cookie.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::services::session_store::SESSION_TTL;
use crate::state::AppState;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);
pub const INSTANCE_IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Spawn the background sweeper. Returns a handle for shutdown.
pub fn spawn_instance_sweeper(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweep_idle_instances(&state, INSTANCE_IDLE_TTL).await;
            if removed > 0 {
                let live = state.instance_count().await;
                tracing::info!(removed, live, "swept idle instances");
            }
            let expired = state.auth.prune_sessions(SESSION_TTL).await;
            if expired > 0 {
                tracing::info!(expired, "pruned expired sessions");
            }
        }
    })
}

/// Remove instances idle for longer than `max_idle`; returns how many went.
pub async fn sweep_idle_instances(state: &AppState, max_idle: Duration) -> usize {
    let now = Instant::now();
    let mut instances = state.instances.write().await;
    let before = instances.len();
    instances.retain(|_, entry| now.duration_since(entry.last_seen) <= max_idle);
    before - instances.len()
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod tests;
