//! Weight changes of a single destination.
//!
//! # Responsibilities
//! - Locate a destination in the live configuration by its handles
//! - Set its weight once (`set`)
//! - Ramp its weight over a time window (`controller`), driven by `ticker`
//!
//! Every change goes through the apply engine as a one-item change set that
//! only permits destination updates.

pub mod controller;
pub mod set;
pub mod ticker;

pub use controller::{control_channel, interpolate_weight, ControlCommand, RampState, WeightRamp};
pub use set::{set_weight, WeightTarget};
