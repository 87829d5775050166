//! ipvsctl
//!
//! Desired state configuration for an ipvs load balancing table.
//!
//! # Architecture Overview
//!
//! ```text
//!   model file ──► params ──► validate ──┐
//!                                        ▼
//!   live table ──► gateway::query ──► changeset ──► apply ──► gateway
//!                                                     ▲
//!                          weight::ticker ──► weight::controller
//! ```

use std::process::ExitCode;

use clap::Parser;

use ipvsctl::cli::{self, exit, Cli, Context};
use ipvsctl::config::AppConfig;
use ipvsctl::observability;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.app_config() {
        Ok(config) => config,
        Err(e) => {
            // logging is not set up yet
            let mut fallback = AppConfig::default();
            cli.apply_flags(&mut fallback);
            observability::init_logging(&fallback.log);
            return report(&cli::CliError::from(e));
        }
    };
    observability::init_logging(&config.log);
    tracing::trace!(?config, "Settings loaded");

    let ctx = Context::new(config);
    let mut stdout = std::io::stdout();

    match cli::run(&cli.command, &ctx, &mut stdout).await {
        Ok(()) => ExitCode::from(exit::EXIT_OK),
        Err(e) => report(&e),
    }
}

/// Log `err` with its chain of causes and pick the exit code.
fn report(err: &cli::CliError) -> ExitCode {
    tracing::error!("{}", err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        tracing::error!("Reason: {}", cause);
        source = cause.source();
    }
    ExitCode::from(err.exit_code())
}
