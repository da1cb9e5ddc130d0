//! Command-level errors (wraps history and domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::history::HistoryError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    History(#[from] HistoryError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("invalid argument '{key}': {message}")]
    InvalidArgument { key: String, message: String },

    #[error("no object with uuid {0}")]
    UnknownObject(String),
}

impl CommandError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for command execution and dispatch.
pub type CommandResult<T> = Result<T, CommandError>;
