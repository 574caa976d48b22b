mod config;
mod db;
mod guard;
mod identity;
mod navigation;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::backend::HttpBackend;
use services::session_store::{PgSessionPersistence, SessionPersistence, SessionStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env();
    let port = config.port;

    // Remote session table (non-fatal: sessions stay local-only without it).
    let remote: Option<Arc<dyn SessionPersistence>> = match config.database_url.as_deref() {
        None => {
            tracing::info!("DATABASE_URL not set; sessions are local-only");
            None
        }
        Some(url) => match db::init_pool(url, config.db_max_connections).await {
            Ok(pool) => Some(Arc::new(PgSessionPersistence::new(pool))),
            Err(e) => {
                tracing::warn!(error = %e, "session database unavailable; sessions are local-only");
                None
            }
        },
    };

    let backend = Arc::new(
        HttpBackend::new(&config.backend_url, config.backend_timeout).expect("failed to build backend client"),
    );
    tracing::info!(backend_url = %config.backend_url, "REST backend configured");

    let sessions = SessionStore::new(remote).with_capacity(config.max_local_sessions);
    tracing::info!(remote = sessions.has_remote(), "session store ready");

    let state = state::AppState::new(config, backend.clone(), backend, sessions);

    // Spawn background sweeper for idle instances.
    let _sweeper = services::sweeper::spawn_instance_sweeper(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "litpath listening");
    axum::serve(listener, app).await.expect("server failed");
}
