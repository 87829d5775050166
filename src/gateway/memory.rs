//! In-process gateway.
//!
//! # Responsibilities
//! - Hold a table in memory behind a mutex
//! - Count opened and closed handles and every call made
//! - Inject failures for a chosen operation or make the table unavailable

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::gateway::table::Table;
use crate::gateway::{
    GatewayError, IpvsGateway, IpvsHandle, KernelDestination, KernelService, Operation,
};

/// Bookkeeping of handle usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayStats {
    pub opens: usize,
    pub closes: usize,
    /// Every call made through a handle, in order.
    pub calls: Vec<Operation>,
}

impl GatewayStats {
    /// Number of calls that changed (or tried to change) the table.
    pub fn mutations(&self) -> usize {
        self.calls.iter().filter(|op| op.is_mutation()).count()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    table: Table,
    stats: GatewayStats,
    unavailable: bool,
    fail_on: Option<Operation>,
}

/// A gateway backed by a table in memory. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: Table) -> Self {
        let gateway = Self::default();
        gateway.lock().table = table;
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current table.
    pub fn table(&self) -> Table {
        self.lock().table.clone()
    }

    pub fn stats(&self) -> GatewayStats {
        self.lock().stats.clone()
    }

    /// Make `open` fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make every call of `operation` fail until reset with `None`.
    pub fn fail_on(&self, operation: Option<Operation>) {
        self.lock().fail_on = operation;
    }
}

impl IpvsGateway for MemoryGateway {
    fn open(&self) -> Result<Box<dyn IpvsHandle>, GatewayError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(GatewayError::Unavailable("memory table disabled".into()));
        }
        state.stats.opens += 1;
        Ok(Box::new(MemoryHandle {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

/// Handle onto a `MemoryGateway`.
#[derive(Debug)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
    closed: bool,
}

impl MemoryHandle {
    fn call<T>(
        &mut self,
        operation: Operation,
        f: impl FnOnce(&mut Table) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        if self.closed {
            return Err(GatewayError::Closed);
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stats.calls.push(operation);
        if state.fail_on == Some(operation) {
            return Err(GatewayError::Failed {
                operation,
                reason: "injected failure".into(),
            });
        }
        f(&mut state.table)
    }
}

impl IpvsHandle for MemoryHandle {
    fn list_services(&mut self) -> Result<Vec<KernelService>, GatewayError> {
        self.call(Operation::ListServices, |t| Ok(t.list_services()))
    }

    fn get_service(&mut self, service: &KernelService) -> Result<KernelService, GatewayError> {
        self.call(Operation::GetService, |t| t.get_service(service))
    }

    fn list_destinations(
        &mut self,
        service: &KernelService,
    ) -> Result<Vec<KernelDestination>, GatewayError> {
        self.call(Operation::ListDestinations, |t| t.list_destinations(service))
    }

    fn create_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.call(Operation::CreateService, |t| t.create_service(service))
    }

    fn update_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.call(Operation::UpdateService, |t| t.update_service(service))
    }

    fn delete_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.call(Operation::DeleteService, |t| t.delete_service(service))
    }

    fn create_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        self.call(Operation::CreateDestination, |t| {
            t.create_destination(service, destination)
        })
    }

    fn update_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        self.call(Operation::UpdateDestination, |t| {
            t.update_destination(service, destination)
        })
    }

    fn delete_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        self.call(Operation::DeleteDestination, |t| {
            t.delete_destination(service, destination)
        })
    }

    fn close(&mut self) -> Result<(), GatewayError> {
        if !self.closed {
            self.closed = true;
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .stats
                .closes += 1;
        }
        Ok(())
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
