//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::commands::CommandError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0} script steps failed")]
    StepsFailed(usize),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::StepsFailed(_) => crate::exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(e) => application_exit_code(e),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Config { .. } => crate::exitcode::CONFIG,
        ApplicationError::Script { .. } => crate::exitcode::DATAERR,
        ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
        ApplicationError::NoScene => crate::exitcode::DATAERR,
        ApplicationError::Command(CommandError::NotFound(_)) => crate::exitcode::USAGE,
        ApplicationError::Command(CommandError::InvalidArgument { .. }) => crate::exitcode::DATAERR,
        ApplicationError::Step { source, .. } => application_exit_code(source),
        ApplicationError::Command(_) | ApplicationError::History(_) => crate::exitcode::SOFTWARE,
    }
}
