//! History-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("cannot {0} while a batch is open")]
    BatchInProgress(&'static str),

    #[error("replay of batch {label} failed: {source}")]
    Replay {
        label: String,
        #[source]
        source: DomainError,
    },
}

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
