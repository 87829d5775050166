//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{load_config, AppConfig, ConfigError};

/// Model file read when `-f` is not given.
pub const DEFAULT_INPUT_FILE: &str = "/etc/ipvsctl.yaml";

#[derive(Debug, Parser)]
#[command(name = "ipvsctl", version)]
#[command(about = "A desired state configuration frontend for ipvs", long_about = None)]
pub struct Cli {
    /// Show debug messages
    #[arg(short, long)]
    pub debug: bool,

    /// Show information. Without it only warnings and errors are shown
    #[arg(short, long)]
    pub verbose: bool,

    /// Show trace messages
    #[arg(long)]
    pub trace: bool,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Table state file
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Dynamic parameters: expose every network interface address as host.NAME
    #[arg(long)]
    pub params_network: bool,

    /// Dynamic parameters: expose every environment entry as env.NAME
    #[arg(long)]
    pub params_env: bool,

    /// Dynamic parameters: add parameters from a YAML or JSON file
    #[arg(long, value_name = "FILE")]
    pub params_file: Vec<PathBuf>,

    /// Dynamic parameters: add parameters from a YAML or JSON resource
    #[arg(long, value_name = "URL")]
    pub params_url: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Retrieve the active configuration
    Get {
        /// Output format
        #[arg(short = 'o', long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Validate a configuration from file or stdin
    Validate {
        /// File to validate. Use - for STDIN
        #[arg(short = 'f', default_value = DEFAULT_INPUT_FILE)]
        file: String,
    },
    /// Compare the active configuration against file or stdin and print the change set
    Changeset {
        /// File to compare against current state. Use - for STDIN
        #[arg(short = 'f', default_value = DEFAULT_INPUT_FILE)]
        file: String,
    },
    /// Apply a new configuration from file or stdin
    Apply {
        /// File to apply. Use - for STDIN
        #[arg(short = 'f', default_value = DEFAULT_INPUT_FILE)]
        file: String,

        /// Leave weights as they are when updating destinations
        #[arg(long)]
        keep_weights: bool,

        /// Comma-separated list of allowed actions.
        /// as=add service, us=update service, ds=delete service,
        /// ad=add destination, ud=update destination, dd=delete destination.
        #[arg(long, default_value = "*", value_name = "ACTIONS_SPEC")]
        allowed_actions: String,
    },
    /// Change services and destinations
    Set {
        #[command(subcommand)]
        command: SetCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Set the weight of a single destination
    Weight {
        /// Weight [0..65535]
        #[arg(value_parser = clap::value_parser!(u16))]
        weight: u16,

        /// Handle of service, e.g. tcp://127.0.0.1:80
        #[arg(short, long)]
        service: String,

        /// Handle of destination, e.g. 10.0.0.1:80
        #[arg(short, long)]
        destination: String,

        /// Number of seconds, for drain/renew mode
        #[arg(short, long, default_value_t = 0)]
        time: u64,
    },
}

impl Cli {
    /// Settings from file (if given), environment, then flags.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };
        config.apply_env(std::env::vars())?;
        self.apply_flags(&mut config);
        Ok(config)
    }

    /// Overlay command line flags onto `config`.
    pub fn apply_flags(&self, config: &mut AppConfig) {
        config.log.trace |= self.trace;
        config.log.debug |= self.debug;
        config.log.verbose |= self.verbose;
        config.params.host_network |= self.params_network;
        config.params.host_env |= self.params_env;
        config.params.files.extend(self.params_file.iter().cloned());
        config.params.urls.extend(self.params_url.iter().cloned());
        if let Some(path) = &self.state_file {
            config.gateway.state_file = path.clone();
        }
    }
}
