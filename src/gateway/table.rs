//! Plain in-process load balancing table.
//!
//! Shared by the memory and state-file gateways. Mirrors the kernel's
//! behaviour for duplicate and missing entries.

use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayError, KernelDestination, KernelService};

/// One service with its destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub service: KernelService,
    #[serde(default)]
    pub destinations: Vec<KernelDestination>,
}

/// The whole table, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub entries: Vec<TableEntry>,
}

impl Table {
    fn entry(&self, service: &KernelService) -> Result<&TableEntry, GatewayError> {
        self.entries
            .iter()
            .find(|e| e.service.same_entry(service))
            .ok_or_else(|| GatewayError::NotFound(service.to_string()))
    }

    fn entry_mut(&mut self, service: &KernelService) -> Result<&mut TableEntry, GatewayError> {
        self.entries
            .iter_mut()
            .find(|e| e.service.same_entry(service))
            .ok_or_else(|| GatewayError::NotFound(service.to_string()))
    }

    pub fn list_services(&self) -> Vec<KernelService> {
        self.entries.iter().map(|e| e.service.clone()).collect()
    }

    pub fn get_service(&self, service: &KernelService) -> Result<KernelService, GatewayError> {
        Ok(self.entry(service)?.service.clone())
    }

    pub fn list_destinations(
        &self,
        service: &KernelService,
    ) -> Result<Vec<KernelDestination>, GatewayError> {
        Ok(self.entry(service)?.destinations.clone())
    }

    pub fn create_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        if self.entry(service).is_ok() {
            return Err(GatewayError::Exists(service.to_string()));
        }
        self.entries.push(TableEntry {
            service: service.clone(),
            destinations: Vec::new(),
        });
        Ok(())
    }

    pub fn update_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.entry_mut(service)?.service = service.clone();
        Ok(())
    }

    pub fn delete_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        let before = self.entries.len();
        self.entries.retain(|e| !e.service.same_entry(service));
        if self.entries.len() == before {
            return Err(GatewayError::NotFound(service.to_string()));
        }
        Ok(())
    }

    pub fn create_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        let entry = self.entry_mut(service)?;
        if entry.destinations.iter().any(|d| d.same_entry(destination)) {
            return Err(GatewayError::Exists(destination.to_string()));
        }
        entry.destinations.push(destination.clone());
        Ok(())
    }

    pub fn update_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        let entry = self.entry_mut(service)?;
        let existing = entry
            .destinations
            .iter_mut()
            .find(|d| d.same_entry(destination))
            .ok_or_else(|| GatewayError::NotFound(destination.to_string()))?;
        *existing = destination.clone();
        Ok(())
    }

    pub fn delete_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        let entry = self.entry_mut(service)?;
        let before = entry.destinations.len();
        entry.destinations.retain(|d| !d.same_entry(destination));
        if entry.destinations.len() == before {
            return Err(GatewayError::NotFound(destination.to_string()));
        }
        Ok(())
    }
}
