//! Configuration model subsystem.
//!
//! # Data Flow
//! ```text
//! YAML input / live table
//!     → types.rs (IpvsConfig, Service, Destination, Defaults)
//!     → address.rs (address grammar)
//!     → defaults.rs (effective value per field)
//!     → equality.rs (identity / full equality)
//!     → validation.rs (structural checks, defaults filled in)
//! ```
//!
//! # Design Decisions
//! - Models are built fresh per operation and never shared
//! - The live table is the only source of truth for "current"

pub mod address;
pub mod defaults;
pub mod equality;
pub mod loader;
pub mod types;
pub mod validation;

pub use address::{DestinationAddress, Protocol, ServiceAddress};
pub use types::{Defaults, Destination, ForwardMode, IpvsConfig, Service};
