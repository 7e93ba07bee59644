//! Central repository for defaults and fixed values
//!
//! Organized by category so timeouts, retry policy and cache defaults have a
//! single source of truth. Every value here can be overridden from
//! `config/main.toml` unless noted otherwise.

/// HTTP client constants
pub mod http {
    /// Default timeout for a single request to the backend
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 15;

    /// Timeout for establishing HTTP connections (not configurable)
    pub const CONNECT_TIMEOUT_SECONDS: u64 = 5;

    /// Retries after the first attempt for connection failures and timeouts
    pub const MAX_RETRIES: u32 = 2;

    /// Base delay between retries, doubled on every attempt
    pub const RETRY_BACKOFF_MILLIS: u64 = 500;

    /// Upper bound of a single backoff delay (not configurable)
    pub const MAX_RETRY_DELAY_MILLIS: u64 = 30_000;

    /// Prefix of every backend route
    pub const API_PREFIX: &str = "/api";
}

/// Cache and preload constants
pub mod cache {
    /// Time window (days) used when the caller does not pick one
    pub const DEFAULT_WINDOW_DAYS: u32 = 7;

    /// Upper bound of in-flight fetches during one preload run
    pub const PRELOAD_CONCURRENCY: usize = 16;
}

/// Session constants
pub mod session {
    /// Default location of the persisted bearer token
    pub const TOKEN_PATH: &str = "data/auth_token";
}
