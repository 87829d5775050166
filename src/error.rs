//! Crate-wide error taxonomy.
//!
//! # Design Decisions
//! - One enum for every layer so callers can map failures to exit codes
//! - Lower-layer errors are kept as `#[source]`, never flattened to strings
//! - Every message names the offending service or destination address

use thiserror::Error;

use crate::gateway::GatewayError;

/// Boxed cause attached to apply failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the reconciliation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed service or destination address string.
    #[error("unable to parse address {input:?}: {reason}")]
    Parse { input: String, reason: String },

    /// Structural violation found by the validator.
    #[error("configuration not valid: {0}")]
    Validation(String),

    /// The table gateway could not be opened.
    #[error("unable to create IPVS handle, is the kernel module installed and active?")]
    GatewayUnavailable(#[source] GatewayError),

    /// Reading from the live table failed.
    #[error("unable to query IPVS {what}")]
    Query {
        what: String,
        #[source]
        source: GatewayError,
    },

    /// Authorization denial or a failed mutation step.
    #[error("unable to apply new config: {what}")]
    Apply {
        what: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Target lookup for a weight change failed.
    #[error("unable to set new value: {0}")]
    Set(String),

    /// Dynamic parameter substitution failed.
    #[error("unable to resolve parameters: {0}")]
    Params(String),

    /// Reading input failed.
    #[error("unable to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input was not valid YAML for the model.
    #[error("unable to parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        Error::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn denied(what: impl Into<String>) -> Self {
        Error::Apply {
            what: what.into(),
            source: None,
        }
    }

    pub(crate) fn apply(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Apply {
            what: what.into(),
            source: Some(source.into()),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
