//! Custom error types for the dashboard store
//!
//! Provides structured error handling with context for the different ways a
//! call to the backend (or the local setup around it) can fail.

use std::fmt;

/// Main error type for the dashboard
#[derive(Debug)]
pub enum DashboardError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Backend communication errors
    Gateway(GatewayError),

    /// Session token errors
    Session(SessionError),

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Backend communication error variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection to the backend failed
    ConnectionFailed { endpoint: String, reason: String },

    /// Request timeout
    Timeout { endpoint: String },

    /// Response could not be decoded
    InvalidResponse { endpoint: String, reason: String },

    /// The backend answered 401; the session has already been cleared
    Unauthorized { endpoint: String },

    /// The backend answered with `success: false`
    Rejected { endpoint: String, message: String },
}

/// Session token error variants
#[derive(Debug)]
pub enum SessionError {
    /// Token file could not be read
    ReadFailed { path: String, reason: String },

    /// Token file could not be written or removed
    WriteFailed { path: String, reason: String },
}

impl GatewayError {
    /// True for failures worth retrying: the request never produced an answer.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::ConnectionFailed { .. } | GatewayError::Timeout { .. }
        )
    }

    /// Message suitable for showing to the person at the dashboard.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Unauthorized { .. } => {
                "Authentication failed, please log in again".to_string()
            }
            GatewayError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            GatewayError::Rejected { .. } => "Request rejected by server".to_string(),
            _ => "Network error, please check the server connection".to_string(),
        }
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Config(e) => write!(f, "Configuration error: {}", e),
            DashboardError::Gateway(e) => write!(f, "Gateway error: {}", e),
            DashboardError::Session(e) => write!(f, "Session error: {}", e),
            DashboardError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::ConnectionFailed { endpoint, reason } => {
                write!(f, "Request to {} failed: {}", endpoint, reason)
            }
            GatewayError::Timeout { endpoint } => {
                write!(f, "Timeout while requesting {}", endpoint)
            }
            GatewayError::InvalidResponse { endpoint, reason } => {
                write!(f, "Invalid response from {}: {}", endpoint, reason)
            }
            GatewayError::Unauthorized { endpoint } => {
                write!(f, "Authentication failed for {}", endpoint)
            }
            GatewayError::Rejected { endpoint, message } => {
                write!(f, "Server rejected {}: {}", endpoint, message)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ReadFailed { path, reason } => {
                write!(f, "Failed to read session token '{}': {}", path, reason)
            }
            SessionError::WriteFailed { path, reason } => {
                write!(f, "Failed to write session token '{}': {}", path, reason)
            }
        }
    }
}

impl std::error::Error for DashboardError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for GatewayError {}
impl std::error::Error for SessionError {}

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Other(err.to_string())
    }
}

impl From<ConfigError> for DashboardError {
    fn from(err: ConfigError) -> Self {
        DashboardError::Config(err)
    }
}

impl From<GatewayError> for DashboardError {
    fn from(err: GatewayError) -> Self {
        DashboardError::Gateway(err)
    }
}

impl From<SessionError> for DashboardError {
    fn from(err: SessionError) -> Self {
        DashboardError::Session(err)
    }
}
