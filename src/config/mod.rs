//! Settings of the tool itself.
//!
//! # Data Flow
//! ```text
//! --config <toml>  ──► loader.rs (parse & deserialize) ──► validation.rs
//!                                                               │
//! IPVSCTL_* env    ──► AppConfig::apply_env ◄───────────────────┘
//!                              │
//! command line flags ──────────┤
//!                              ▼
//!                      AppConfig (immutable, passed by reference)
//! ```
//!
//! # Design Decisions
//! - Constructed once per invocation in `main`; no global singleton
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, GatewayConfig, LogConfig, ParamsConfig};
