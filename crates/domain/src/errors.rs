//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for BusySync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum BusySyncError {
    /// Fatal configuration problem detected at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure isolated to a single account (bad credentials, unreachable
    /// API).
    #[error("Account {account_id} error: {message}")]
    Account { account_id: u32, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    /// 5xx, 429, timeouts and connection failures. Safe to retry.
    #[error("Transient API error: {0}")]
    TransientApi(String),

    /// 4xx responses other than not-found-on-delete. Never retried.
    #[error("API error (HTTP {status}): {message}")]
    PermanentApi { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed webhook payloads or headers.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BusySyncError {
    /// Whether the failure belongs to the transient class that a retry
    /// policy may re-attempt.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientApi(_))
    }

    /// Stable label suitable for structured logging.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Account { .. } => "account",
            Self::Auth(_) => "auth",
            Self::TransientApi(_) => "transient_api",
            Self::PermanentApi { .. } => "permanent_api",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for BusySync operations
pub type Result<T> = std::result::Result<T, BusySyncError>;
