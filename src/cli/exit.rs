//! Process exit codes.

use thiserror::Error;

use crate::config::ConfigError;
use crate::error::Error;

pub const EXIT_OK: u8 = 0;
pub const EXIT_HANDLE_ERR: u8 = 20;
pub const EXIT_QUERY_ERR: u8 = 21;
pub const EXIT_INVALID_FILE: u8 = 30;
pub const EXIT_APPLY_ERR: u8 = 31;
pub const EXIT_VALIDATE_ERR: u8 = 32;
pub const EXIT_INVALID_INPUT: u8 = 33;
pub const EXIT_SET_ERR: u8 = 34;
pub const EXIT_OUTPUT_ERR: u8 = 100;
pub const EXIT_UNKNOWN: u8 = 127;

/// Failure of a command, carrying what the exit code is derived from.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("unable to load settings")]
    Config(#[from] ConfigError),

    #[error("unable to set new weight")]
    SetFailed(#[source] Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unable to format output: {0}")]
    Output(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Core(err) => match err {
                Error::GatewayUnavailable(_) => EXIT_HANDLE_ERR,
                Error::Query { .. } => EXIT_QUERY_ERR,
                Error::Io { .. } | Error::Yaml(_) | Error::Params(_) => EXIT_INVALID_FILE,
                Error::Apply { .. } => EXIT_APPLY_ERR,
                Error::Validation(_) | Error::Parse { .. } => EXIT_VALIDATE_ERR,
                Error::Set(_) => EXIT_SET_ERR,
            },
            CliError::Config(_) => EXIT_INVALID_FILE,
            CliError::SetFailed(_) => EXIT_SET_ERR,
            CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
            CliError::Output(_) => EXIT_OUTPUT_ERR,
        }
    }
}
