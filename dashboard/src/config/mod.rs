pub mod manager;

use crate::constants::{cache, http, session};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_millis: u64,
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
    #[serde(default = "default_preload_concurrency")]
    pub preload_concurrency: usize,
    #[serde(default = "default_preload_on_start")]
    pub preload_on_start: bool,
}

fn default_token_path() -> String {
    session::TOKEN_PATH.to_string()
}

fn default_request_timeout() -> u64 {
    http::REQUEST_TIMEOUT_SECONDS
}

fn default_max_retries() -> u32 {
    http::MAX_RETRIES
}

fn default_retry_backoff() -> u64 {
    http::RETRY_BACKOFF_MILLIS
}

fn default_window_days() -> u32 {
    cache::DEFAULT_WINDOW_DAYS
}

fn default_preload_concurrency() -> usize {
    cache::PRELOAD_CONCURRENCY
}

fn default_preload_on_start() -> bool {
    true
}

impl Config {
    /// Config with every optional field at its default.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            token_path: default_token_path(),
            request_timeout_seconds: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_millis: default_retry_backoff(),
            default_window_days: default_window_days(),
            preload_concurrency: default_preload_concurrency(),
            preload_on_start: default_preload_on_start(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: format!("'{}' is not an http(s) URL", self.api_base_url),
            });
        }
        if self.default_window_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_window_days".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.preload_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "preload_concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
