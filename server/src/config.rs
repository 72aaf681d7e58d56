//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Business phone identifier used by the bundled sample archive.
pub const DEFAULT_BUSINESS_PHONE_ID: &str = "918329446654";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:5000")
    pub bind_address: String,

    /// `PostgreSQL` connection URL. Without it messages live in memory.
    pub database_url: Option<String>,

    /// Redis connection URL for cross-instance event fan-out (optional)
    pub redis_url: Option<String>,

    /// Phone identifier of the business account. Senders matching it are outbound.
    pub business_phone_id: String,

    /// Token expected in the webhook subscription handshake (optional)
    pub webhook_verify_token: Option<String>,

    /// App secret used to check `X-Hub-Signature-256` on incoming webhooks (optional)
    pub webhook_app_secret: Option<String>,

    /// Directory scanned by the sample batch endpoint
    pub samples_dir: PathBuf,

    /// Directory holding the built browser client (optional)
    pub static_dir: Option<PathBuf>,

    /// Maximum request body size in bytes (default: 10MB)
    pub max_body_size: usize,

    /// Capacity of the real-time broadcast buffer
    pub event_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let business_phone_id = env::var("BUSINESS_PHONE_ID")
            .unwrap_or_else(|_| DEFAULT_BUSINESS_PHONE_ID.into())
            .trim()
            .to_string();
        if business_phone_id.is_empty() {
            bail!("BUSINESS_PHONE_ID must not be empty");
        }

        let event_buffer = env::var("EVENT_BUFFER")
            .ok()
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("EVENT_BUFFER must be a positive integer")?
            .unwrap_or(256);
        if event_buffer == 0 {
            bail!("EVENT_BUFFER must be a positive integer");
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".into()),
            database_url: non_empty_var("DATABASE_URL"),
            redis_url: non_empty_var("REDIS_URL"),
            business_phone_id,
            webhook_verify_token: non_empty_var("WEBHOOK_VERIFY_TOKEN"),
            webhook_app_secret: non_empty_var("WEBHOOK_APP_SECRET"),
            samples_dir: env::var("SAMPLES_DIR")
                .unwrap_or_else(|_| "samples".into())
                .into(),
            static_dir: non_empty_var("STATIC_DIR").map(PathBuf::from),
            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB
            event_buffer,
        })
    }

    /// Create a default configuration for testing.
    ///
    /// Uses the in-memory store and the local event hub, no signature checks.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".into(),
            database_url: None,
            redis_url: None,
            business_phone_id: DEFAULT_BUSINESS_PHONE_ID.into(),
            webhook_verify_token: Some("test-verify-token".into()),
            webhook_app_secret: None,
            samples_dir: "samples".into(),
            static_dir: None,
            max_body_size: 10 * 1024 * 1024,
            event_buffer: 64,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "BIND_ADDRESS",
        "DATABASE_URL",
        "REDIS_URL",
        "BUSINESS_PHONE_ID",
        "WEBHOOK_VERIFY_TOKEN",
        "WEBHOOK_APP_SECRET",
        "SAMPLES_DIR",
        "STATIC_DIR",
        "MAX_BODY_SIZE",
        "EVENT_BUFFER",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_environment() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.business_phone_id, DEFAULT_BUSINESS_PHONE_ID);
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert!(config.webhook_app_secret.is_none());
        assert_eq!(config.samples_dir, PathBuf::from("samples"));
        assert_eq!(config.event_buffer, 256);
    }

    #[test]
    #[serial]
    fn reads_overrides_and_ignores_blank_values() {
        clear_env();
        env::set_var("BUSINESS_PHONE_ID", " 15550001111 ");
        env::set_var("DATABASE_URL", "   ");
        env::set_var("WEBHOOK_APP_SECRET", "s3cret");
        env::set_var("EVENT_BUFFER", "16");
        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.business_phone_id, "15550001111");
        assert!(config.database_url.is_none());
        assert_eq!(config.webhook_app_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.event_buffer, 16);
    }

    #[test]
    #[serial]
    fn rejects_zero_event_buffer() {
        clear_env();
        env::set_var("EVENT_BUFFER", "0");
        let result = Config::from_env();
        clear_env();
        assert!(result.is_err());
    }
}
