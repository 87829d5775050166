//! Command implementations.
//!
//! # Data Flow
//! ```text
//! -f FILE ──► read_model ──► resolve_params ──► validate ──┐
//!                                                          ├──► changeset / apply
//! gateway ──► fetch_current ───────────────────────────────┘
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::apply::{AllowedActions, ApplyEngine, ApplyOpts};
use crate::cli::args::{Command, OutputFormat, SetCommand};
use crate::cli::exit::CliError;
use crate::config::AppConfig;
use crate::error::Error;
use crate::gateway::{fetch_current, IpvsGateway, StateFileGateway};
use crate::lifecycle::{signals, Shutdown};
use crate::model::loader::read_model;
use crate::model::types::IpvsConfig;
use crate::params::build_chain;
use crate::weight::{control_channel, set_weight, ticker, RampState, WeightRamp};

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub config: AppConfig,
    pub gateway: Arc<dyn IpvsGateway>,
    pub shutdown: Shutdown,
}

impl Context {
    /// Context backed by the configured state file.
    pub fn new(config: AppConfig) -> Self {
        let gateway = Arc::new(StateFileGateway::new(config.gateway.state_file.clone()));
        Self::with_gateway(config, gateway)
    }

    pub fn with_gateway(config: AppConfig, gateway: Arc<dyn IpvsGateway>) -> Self {
        Self {
            config,
            gateway,
            shutdown: Shutdown::new(),
        }
    }

    fn engine(&self) -> ApplyEngine {
        ApplyEngine::new(Arc::clone(&self.gateway))
    }

    fn current(&self) -> Result<IpvsConfig, CliError> {
        Ok(fetch_current(self.gateway.as_ref())?)
    }
}

fn output(out: &mut dyn Write, text: &str) -> Result<(), CliError> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| CliError::Output(e.to_string()))
}

/// Read, resolve and validate the model in `file`.
pub async fn load_target(ctx: &Context, file: &str) -> Result<IpvsConfig, CliError> {
    if file.is_empty() {
        return Err(Error::Io {
            path: String::new(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "must specify an input file or - for stdin",
            ),
        }
        .into());
    }

    let raw = read_model(file)?;
    let chain = build_chain(&ctx.config).await?;
    let mut target = raw.resolve_params(&chain)?;
    target.validate()?;
    tracing::debug!(file, services = target.services.len(), "Target model ready");
    Ok(target)
}

/// Run `command`, writing its regular output to `out`.
pub async fn run(command: &Command, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Get { output: format } => get(ctx, *format, out),
        Command::Validate { file } => validate(ctx, file, out).await,
        Command::Changeset { file } => changeset(ctx, file, out).await,
        Command::Apply {
            file,
            keep_weights,
            allowed_actions,
        } => apply(ctx, file, *keep_weights, allowed_actions).await,
        Command::Set {
            command:
                SetCommand::Weight {
                    weight,
                    service,
                    destination,
                    time,
                },
        } => set_weight_command(ctx, service, destination, i32::from(*weight), *time).await,
    }
}

fn get(ctx: &Context, format: OutputFormat, out: &mut dyn Write) -> Result<(), CliError> {
    let current = ctx.current()?;
    let text = match format {
        OutputFormat::Text => current
            .services
            .iter()
            .map(|s| format!("{}\n", s.address))
            .collect::<String>(),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&current).map_err(|e| CliError::Output(e.to_string()))?
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&current)
                .map_err(|e| CliError::Output(e.to_string()))?;
            json.push('\n');
            json
        }
    };
    output(out, &text)
}

async fn validate(ctx: &Context, file: &str, out: &mut dyn Write) -> Result<(), CliError> {
    tracing::debug!(file, "Validating");
    match load_target(ctx, file).await {
        Ok(_) => output(out, "Configuration valid.\n"),
        Err(CliError::Core(Error::Validation(reason))) => {
            output(out, &format!("Configuration contains errors: {}\n", reason))?;
            Err(Error::Validation(reason).into())
        }
        Err(e) => Err(e),
    }
}

async fn changeset(ctx: &Context, file: &str, out: &mut dyn Write) -> Result<(), CliError> {
    let target = load_target(ctx, file).await?;
    let current = ctx.current()?;
    let cs = current.changeset(&target, false)?;
    let text = serde_yaml::to_string(&cs).map_err(|e| CliError::Output(e.to_string()))?;
    output(out, &text)
}

async fn apply(
    ctx: &Context,
    file: &str,
    keep_weights: bool,
    allowed_actions: &str,
) -> Result<(), CliError> {
    let allowed_actions: AllowedActions = allowed_actions
        .parse()
        .map_err(|e: Error| CliError::InvalidInput(e.to_string()))?;
    tracing::trace!(allowed = %allowed_actions, "Parsed allowed actions");

    let target = load_target(ctx, file).await?;
    let current = ctx.current()?;
    let opts = ApplyOpts {
        keep_weights,
        allowed_actions,
    };
    let cs = ctx.engine().apply(&current, &target, &opts)?;
    tracing::info!(items = cs.len(), "Applied configuration from {}", file);
    Ok(())
}

async fn set_weight_command(
    ctx: &Context,
    service: &str,
    destination: &str,
    weight: i32,
    secs: u64,
) -> Result<(), CliError> {
    if service.is_empty() {
        return Err(CliError::InvalidInput("service handle must not be empty".into()));
    }
    if destination.is_empty() {
        return Err(CliError::InvalidInput("destination handle must not be empty".into()));
    }

    let current = ctx.current()?;
    let engine = ctx.engine();

    if secs == 0 {
        return set_weight(&engine, &current, service, destination, weight)
            .map_err(CliError::SetFailed);
    }

    let duration = Duration::from_secs(secs);
    let mut ramp = WeightRamp::new(engine, current, service, destination, weight, duration)
        .map_err(CliError::SetFailed)?;

    let (tx, mut rx) = control_channel();
    let signal_task = signals::spawn_signal_handler(ctx.shutdown.clone());
    let ticker_task = tokio::spawn(ticker::drive(tx, duration, ctx.shutdown.listener()));

    let result = ramp.run(&mut rx).await;
    drop(rx);
    signal_task.abort();
    ticker_task.abort();

    match result.map_err(CliError::SetFailed)? {
        RampState::Cancelled if ctx.shutdown.is_triggered() => {
            tracing::warn!("Weight change interrupted by signal")
        }
        RampState::Cancelled => tracing::warn!("Weight change cancelled"),
        state => tracing::debug!(?state, "Weight change done"),
    }
    Ok(())
}
