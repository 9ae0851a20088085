//! Serialisable error returned by every command

use busysync_domain::BusySyncError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error surfaced to callers of the command layer as structured JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CommandError {
    /// Stable error class, see [`BusySyncError::label`]
    pub kind: String,
    pub message: String,
}

impl CommandError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self { kind: "invalid_input".to_string(), message: message.into() }
    }
}

impl From<BusySyncError> for CommandError {
    fn from(err: BusySyncError) -> Self {
        Self { kind: err.label().to_string(), message: err.to_string() }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
