//! Table gateway subsystem.
//!
//! # Data Flow
//! ```text
//! query.rs (Get)          apply engine (mutations)
//!     │                          │
//!     └──────► IpvsGateway::open ◄┘
//!                   │
//!                   ▼
//!             IpvsHandle (list/get/create/update/delete)
//!                   │
//!         ┌─────────┴──────────┐
//!         ▼                    ▼
//!   memory.rs (in-process)   file.rs (JSON state file)
//! ```
//!
//! # Design Decisions
//! - One handle per operation; handles close on drop so every exit path releases them
//! - All calls are synchronous and fail with a `GatewayError`
//! - A kernel (netlink) backend plugs in behind the same two traits

pub mod file;
pub mod memory;
pub mod query;
pub mod table;
pub mod types;

use thiserror::Error;

pub use file::StateFileGateway;
pub use memory::MemoryGateway;
pub use query::fetch_current;
pub use types::{KernelDestination, KernelService};

/// Errors reported by a table backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The table cannot be reached at all.
    #[error("table unavailable: {0}")]
    Unavailable(String),

    /// The addressed service or destination does not exist.
    #[error("no such entry: {0}")]
    NotFound(String),

    /// The service or destination to create exists already.
    #[error("entry already exists: {0}")]
    Exists(String),

    /// The handle was used after close.
    #[error("handle is closed")]
    Closed,

    /// The backend rejected the call.
    #[error("{operation:?} failed: {reason}")]
    Failed { operation: Operation, reason: String },

    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Calls a handle offers, used for failure injection and bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListServices,
    GetService,
    ListDestinations,
    CreateService,
    UpdateService,
    DeleteService,
    CreateDestination,
    UpdateDestination,
    DeleteDestination,
}

impl Operation {
    /// True for calls that change the table.
    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            Operation::ListServices | Operation::GetService | Operation::ListDestinations
        )
    }
}

/// Entry point to a live table.
pub trait IpvsGateway: Send + Sync {
    /// Open a handle to the table.
    fn open(&self) -> Result<Box<dyn IpvsHandle>, GatewayError>;
}

/// An open connection to the table.
pub trait IpvsHandle {
    fn list_services(&mut self) -> Result<Vec<KernelService>, GatewayError>;

    fn get_service(&mut self, service: &KernelService) -> Result<KernelService, GatewayError>;

    fn list_destinations(
        &mut self,
        service: &KernelService,
    ) -> Result<Vec<KernelDestination>, GatewayError>;

    fn create_service(&mut self, service: &KernelService) -> Result<(), GatewayError>;

    fn update_service(&mut self, service: &KernelService) -> Result<(), GatewayError>;

    fn delete_service(&mut self, service: &KernelService) -> Result<(), GatewayError>;

    fn create_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError>;

    fn update_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError>;

    fn delete_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError>;

    /// Release the handle. Calling it twice is a no-op.
    fn close(&mut self) -> Result<(), GatewayError>;
}
