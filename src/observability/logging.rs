//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Map the verbosity switches to a filter directive
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Output goes to stderr so stdout stays machine-readable
//! - `RUST_LOG` overrides the switches when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Filter directive for the given switches. The most verbose switch wins.
pub fn level_directive(log: &LogConfig) -> &'static str {
    if log.trace {
        "ipvsctl=trace"
    } else if log.debug {
        "ipvsctl=debug"
    } else if log.verbose {
        "ipvsctl=info"
    } else {
        "ipvsctl=warn"
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_directive(log)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        let mut log = LogConfig::default();
        assert_eq!(level_directive(&log), "ipvsctl=warn");
        log.verbose = true;
        assert_eq!(level_directive(&log), "ipvsctl=info");
        log.trace = true;
        assert_eq!(level_directive(&log), "ipvsctl=trace");
    }
}
