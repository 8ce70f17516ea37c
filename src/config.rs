//! Server configuration loaded from the environment

use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEV_AUTH_SECRET: &str = "dev-secret-change-me";

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection URL
    pub database_url: String,
    /// HMAC secret for session tokens
    pub auth_secret: String,
    pub host: IpAddr,
    pub port: u16,
    /// Base URL of the generative-language API, without a trailing slash
    pub gemini_api_base: String,
    /// Buffer chat streams in memory so clients can reattach
    pub resumable_streams: bool,
    pub db_pool_size: usize,
    /// Offer the weather tool to the model
    pub enable_tools: bool,
    /// Pause between smoothed word chunks
    pub smooth_stream_delay: Duration,
}

impl AppConfig {
    /// Read configuration from process environment (after loading `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("POSTGRES_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("POSTGRES_URL"))?;

        let auth_secret = match lookup("AUTH_SECRET").filter(|v| !v.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("AUTH_SECRET is not set, using the development secret");
                DEV_AUTH_SECRET.to_string()
            }
        };

        let host = parse_or(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or(&lookup, "PORT", 3030u16)?;
        let gemini_api_base = lookup("GEMINI_API_BASE")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let resumable_streams = parse_bool(&lookup, "RESUMABLE_STREAMS")?;
        let db_pool_size = parse_or(&lookup, "DB_POOL_SIZE", 16usize)?;
        let enable_tools = parse_bool(&lookup, "ENABLE_TOOLS")?;
        let delay_ms = parse_or(&lookup, "SMOOTH_STREAM_DELAY_MS", 10u64)?;

        Ok(Self {
            database_url,
            auth_secret,
            host,
            port,
            gemini_api_base,
            resumable_streams,
            db_pool_size,
            enable_tools,
            smooth_stream_delay: Duration::from_millis(delay_ms),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).filter(|v| !v.is_empty()) {
        None => Ok(false),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("POSTGRES_URL", "postgres://u:p@h/db")]))
                .unwrap();

        assert_eq!(config.port, 3030);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.gemini_api_base, DEFAULT_GEMINI_API_BASE);
        assert!(!config.resumable_streams);
        assert!(!config.enable_tools);
        assert_eq!(config.db_pool_size, 16);
        assert_eq!(config.smooth_stream_delay, Duration::from_millis(10));
        assert_eq!(config.auth_secret, DEV_AUTH_SECRET);
    }

    #[test]
    fn test_missing_database_url() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("POSTGRES_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("POSTGRES_URL", "postgres://u:p@h/db"),
            ("PORT", "8080"),
            ("HOST", "0.0.0.0"),
            ("RESUMABLE_STREAMS", "true"),
            ("GEMINI_API_BASE", "http://localhost:9999/v1beta/"),
            ("SMOOTH_STREAM_DELAY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert!(config.resumable_streams);
        assert_eq!(config.gemini_api_base, "http://localhost:9999/v1beta");
        assert_eq!(config.smooth_stream_delay, Duration::ZERO);
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("POSTGRES_URL", "postgres://u:p@h/db"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_invalid_bool() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("POSTGRES_URL", "postgres://u:p@h/db"),
            ("RESUMABLE_STREAMS", "maybe"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "RESUMABLE_STREAMS", .. }));
    }
}
