//! API server configuration.

use std::fmt;

use agora_core::auth::jwt::{DEFAULT_ACCESS_TOKEN_TTL_SECS, resolve_jwt_secret};

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Token signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl_secs: i64,
    /// Whether the refresh cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                              |
    /// |-------------------------|--------------------------------------|
    /// | `BIND_ADDR`             | `127.0.0.1:3100`                     |
    /// | `DATABASE_URL`          | `postgres://localhost:5432/agora`    |
    /// | `JWT_SECRET`            | generated & persisted to file        |
    /// | `ACCESS_TOKEN_TTL_SECS` | `1800`                               |
    /// | `COOKIE_SECURE`         | `true`                               |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/agora".into()),
            jwt_secret: resolve_jwt_secret(),
            access_token_ttl_secs: std::env::var("ACCESS_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        }
    }

    /// Defaults for everything but the secret; no environment access.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            jwt_secret: jwt_secret.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            cookie_secure: true,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}
