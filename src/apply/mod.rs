//! Applying change sets to the live table.
//!
//! # Responsibilities
//! - Parse and hold the set of allowed mutation kinds
//! - Authorize a whole change set before the first mutation
//! - Execute items fail-fast through a gateway handle

pub mod actions;
pub mod engine;

pub use actions::{AllowedActions, ApplyAction, ApplyOpts};
pub use engine::ApplyEngine;
