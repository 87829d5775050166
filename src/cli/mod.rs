//! Command line surface.
//!
//! # Responsibilities
//! - Define flags and subcommands (clap derive)
//! - Merge settings file, environment and flags into one `AppConfig`
//! - Run a command and map its failure to a process exit code

pub mod args;
pub mod commands;
pub mod exit;

pub use args::{Cli, Command, OutputFormat, SetCommand};
pub use commands::{run, Context};
pub use exit::CliError;
