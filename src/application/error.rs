//! Application-level errors (wraps command and history errors)

use thiserror::Error;

use crate::commands::CommandError;
use crate::history::HistoryError;

/// Application errors wrap lower layers and add use-case context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    History(#[from] HistoryError),

    #[error("step {index} ({step}) failed: {source}")]
    Step {
        index: usize,
        step: String,
        #[source]
        source: Box<ApplicationError>,
    },

    #[error("invalid script {context}: {message}")]
    Script { context: String, message: String },

    #[error("no scene is open")]
    NoScene,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
