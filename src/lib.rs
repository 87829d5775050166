//! ipvsctl library
//!
//! Reconciles an ipvs table against a declarative model: load and validate
//! the model, compute the change set against the live table, and apply it
//! within a set of allowed actions.

pub mod apply;
pub mod changeset;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod params;
pub mod weight;

pub use apply::{AllowedActions, ApplyEngine, ApplyOpts};
pub use changeset::{ChangeSet, ChangeSetItem};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use gateway::IpvsGateway;
pub use lifecycle::Shutdown;
pub use model::types::IpvsConfig;
