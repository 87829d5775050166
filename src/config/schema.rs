//! Settings of the tool itself.
//!
//! All types derive Serde traits for deserialization from a TOML file and
//! every field has a default, so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default location of the table state file.
pub const DEFAULT_STATE_FILE: &str = "/var/lib/ipvsctl/table.json";

/// Root settings, constructed once per invocation and passed by reference.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Log verbosity.
    pub log: LogConfig,

    /// Sources for dynamic parameters.
    pub params: ParamsConfig,

    /// Table backend settings.
    pub gateway: GatewayConfig,
}

/// Log verbosity switches. The most verbose one set wins.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub trace: bool,
    pub debug: bool,
    pub verbose: bool,
}

/// Where `${name}` placeholders are resolved from.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ParamsConfig {
    /// Expose local interface addresses as `host.IFACE` and `host.IFACE_N`.
    pub host_network: bool,

    /// Expose process environment as `env.NAME`.
    pub host_env: bool,

    /// JSON or YAML parameter files, in resolution order.
    pub files: Vec<PathBuf>,

    /// URLs serving JSON or YAML parameter documents.
    pub urls: Vec<String>,
}

impl ParamsConfig {
    /// True if no parameter source is configured.
    pub fn is_empty(&self) -> bool {
        !self.host_network && !self.host_env && self.files.is_empty() && self.urls.is_empty()
    }
}

/// Table backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// JSON file holding the table.
    pub state_file: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}
