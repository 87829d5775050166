//! Settings loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {name}")]
    Env { name: String, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate settings from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

pub const ENV_LOG_TRACE: &str = "IPVSCTL_LOG_TRACE";
pub const ENV_LOG_DEBUG: &str = "IPVSCTL_LOG_DEBUG";
pub const ENV_LOG_VERBOSE: &str = "IPVSCTL_LOG_VERBOSE";
pub const ENV_PARAMS_HOST_NETWORK: &str = "IPVSCTL_PARAMS_HOST_NETWORK";
pub const ENV_PARAMS_HOST_ENV: &str = "IPVSCTL_PARAMS_HOST_ENV";
pub const ENV_PARAMS_FILE: &str = "IPVSCTL_PARAMS_FILE";
pub const ENV_PARAMS_URLS: &str = "IPVSCTL_PARAMS_URLS";
pub const ENV_STATE_FILE: &str = "IPVSCTL_STATE_FILE";

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl AppConfig {
    /// Overlay `IPVSCTL_*` variables. Switches set to true stay true, lists are appended.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            match name.as_str() {
                ENV_LOG_TRACE => self.log.trace |= parse_bool(&name, &value)?,
                ENV_LOG_DEBUG => self.log.debug |= parse_bool(&name, &value)?,
                ENV_LOG_VERBOSE => self.log.verbose |= parse_bool(&name, &value)?,
                ENV_PARAMS_HOST_NETWORK => {
                    self.params.host_network |= parse_bool(&name, &value)?
                }
                ENV_PARAMS_HOST_ENV => self.params.host_env |= parse_bool(&name, &value)?,
                ENV_PARAMS_FILE => self
                    .params
                    .files
                    .extend(split_list(&value).map(PathBuf::from)),
                ENV_PARAMS_URLS => self
                    .params
                    .urls
                    .extend(split_list(&value).map(String::from)),
                ENV_STATE_FILE if !value.is_empty() => {
                    self.gateway.state_file = PathBuf::from(value)
                }
                _ => {}
            }
        }
        Ok(())
    }
}
