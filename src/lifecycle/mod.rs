//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger (latched) → ShutdownListener::wait → ticker sends Exit
//!     → weight ramp ends Cancelled
//! ```
//!
//! # Design Decisions
//! - Cancellation is a message, never an out-of-band abort
//! - One-shot commands (get/validate/apply) do not subscribe

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
