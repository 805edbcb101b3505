use std::env;
use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub addr: SocketAddr,
    /// When unset the server falls back to the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);
        let run_migrations = env::var("RUN_MIGRATIONS")
            .ok()
            .map(|s| parse_flag(&s))
            .unwrap_or(true);

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24 * 14);
        let cookie_secure = env::var("COOKIE_SECURE")
            .ok()
            .map(|s| parse_flag(&s))
            .unwrap_or(false);

        Ok(Self {
            port,
            addr,
            database_url,
            database_max_connections,
            run_migrations,
            jwt_secret,
            session_ttl_hours,
            cookie_secure,
        })
    }

    /// Settings for tests and local tooling: in-memory store, fixed secret.
    pub fn for_memory_store(jwt_secret: &str) -> Self {
        Self {
            port: 0,
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            database_max_connections: 1,
            run_migrations: false,
            jwt_secret: jwt_secret.to_string(),
            session_ttl_hours: 1,
            cookie_secure: false,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
