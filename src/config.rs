//! Service configuration parsed from environment variables.

use std::time::Duration;

use crate::services::session_store::DEFAULT_LOCAL_SESSION_CAPACITY;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_AUTH_RESTORE_WAIT_MS: u64 = 250;
pub const DEFAULT_MAX_INSTANCES: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub backend_url: String,
    pub backend_timeout: Duration,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub cookie_secure: bool,
    pub restore_wait: Duration,
    pub max_instances: usize,
    pub max_local_sessions: usize,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Optional (all have defaults):
    /// - `PORT`: default 3000
    /// - `BACKEND_URL`: REST backend base URL
    /// - `BACKEND_TIMEOUT_SECS`: default 15
    /// - `DATABASE_URL`: remote session table; sessions are local-only when unset
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `COOKIE_SECURE`: inferred from the `BACKEND_URL` scheme when unset
    /// - `AUTH_RESTORE_WAIT_MS`: default 250
    /// - `MAX_INSTANCES`: live application instances kept in memory, default 10000
    /// - `MAX_LOCAL_SESSIONS`: session records kept in memory, default 50000
    #[must_use]
    pub fn from_env() -> Self {
        let backend_url = std::env::var("BACKEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned();
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| backend_url.starts_with("https://"));
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            backend_url,
            backend_timeout: Duration::from_secs(env_parse("BACKEND_TIMEOUT_SECS", DEFAULT_BACKEND_TIMEOUT_SECS)),
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            cookie_secure,
            restore_wait: Duration::from_millis(env_parse("AUTH_RESTORE_WAIT_MS", DEFAULT_AUTH_RESTORE_WAIT_MS)),
            max_instances: env_parse("MAX_INSTANCES", DEFAULT_MAX_INSTANCES).max(1),
            max_local_sessions: env_parse("MAX_LOCAL_SESSIONS", DEFAULT_LOCAL_SESSION_CAPACITY).max(1),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            cookie_secure: false,
            restore_wait: Duration::from_millis(DEFAULT_AUTH_RESTORE_WAIT_MS),
            max_instances: DEFAULT_MAX_INSTANCES,
            max_local_sessions: DEFAULT_LOCAL_SESSION_CAPACITY,
        }
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
