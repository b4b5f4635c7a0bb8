//! API server configuration.

use std::fmt;

use taskhive_core::auth::jwt::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, resolve_jwt_secret};
use tracing::warn;

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: i64,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                     |
    /// |--------------------|---------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3000`                            |
    /// | `DATABASE_URL`     | unset (in-memory store)                     |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file     |
    /// | `TOKEN_TTL_SECS`   | `86400`                                     |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            jwt_secret: resolve_jwt_secret(),
            token_ttl_secs: token_ttl_from_env(),
        }
    }

    /// Replace the host and/or port of `bind_addr`, keeping whichever part
    /// is not given.
    pub fn override_bind(&mut self, host: Option<&str>, port: Option<u16>) {
        if host.is_none() && port.is_none() {
            return;
        }
        let (current_host, current_port) = match self.bind_addr.rsplit_once(':') {
            Some((h, p)) => (h.to_string(), p.to_string()),
            None => (self.bind_addr.clone(), "3000".to_string()),
        };
        let host = host.map_or(current_host, str::to_string);
        let port = port.map_or(current_port, |p| p.to_string());
        self.bind_addr = format!("{host}:{port}");
    }
}

fn token_ttl_from_env() -> i64 {
    match std::env::var("TOKEN_TTL_SECS") {
        Ok(raw) => parse_ttl(&raw).unwrap_or_else(|| {
            warn!(value = %raw, "ignoring invalid TOKEN_TTL_SECS");
            DEFAULT_TOKEN_TTL_SECS
        }),
        Err(_) => DEFAULT_TOKEN_TTL_SECS,
    }
}

fn parse_ttl(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|secs| (1..=MAX_TOKEN_TTL_SECS).contains(secs))
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}
