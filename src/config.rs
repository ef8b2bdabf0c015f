// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::RetryPolicy;

/// Sync subsystem configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the durable outbox store
    pub store_path: PathBuf,
    /// Base URL of the hosted data service
    pub backend_url: String,
    /// Bearer token for the "submit meeting" operation (tenant-scoped)
    pub backend_api_token: String,
    /// Per-submission request timeout
    pub submit_timeout: Duration,
    /// Base delay before retrying a failed submission
    pub retry_base: Duration,
    /// Upper bound on the retry delay
    pub retry_cap: Duration,
    /// Optional dead-letter threshold; unset retries forever
    pub retry_max_attempts: Option<u32>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./outbox"),
            backend_url: "http://localhost:54321".to_string(),
            backend_api_token: "test_token".to_string(),
            submit_timeout: Duration::from_secs(30),
            retry_base: Duration::from_secs(2),
            retry_cap: Duration::from_secs(300),
            retry_max_attempts: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            store_path: env::var("CELULA_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./outbox")),
            backend_url: env::var("BACKEND_URL").map_err(|_| ConfigError::Missing("BACKEND_URL"))?,
            backend_api_token: env::var("BACKEND_API_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_API_TOKEN"))?,
            submit_timeout: env_secs("SUBMIT_TIMEOUT_SECS", 30)?,
            retry_base: env_secs("RETRY_BASE_SECS", 2)?,
            retry_cap: env_secs("RETRY_CAP_SECS", 300)?,
            retry_max_attempts: match env::var("RETRY_MAX_ATTEMPTS") {
                Ok(v) => Some(
                    v.parse()
                        .map_err(|_| ConfigError::Invalid("RETRY_MAX_ATTEMPTS"))?,
                ),
                Err(_) => None,
            },
        })
    }

    /// Retry policy derived from the configured knobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base: self.retry_base,
            cap: self.retry_cap,
            max_attempts: self.retry_max_attempts,
        }
    }
}

/// Read a duration in whole seconds from the environment, with a default.
fn env_secs(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
