use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Endpoint the ranking payload is posted to.
    pub ranking_service_url: String,
    pub geocoding_url: String,
    pub geocoding_user_agent: String,
    pub outbound_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            ranking_service_url: require_env("RANKING_SERVICE_URL")?,
            geocoding_url: std::env::var("GEOCODING_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODING_URL.to_string()),
            geocoding_user_agent: std::env::var("GEOCODING_USER_AGENT")
                .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string()),
            outbound_timeout: Duration::from_secs(parse_env("OUTBOUND_TIMEOUT_SECS", 30)?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
