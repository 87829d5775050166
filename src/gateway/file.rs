//! Gateway persisting the table as a JSON state file.
//!
//! Opening a handle loads the file (a missing file is an empty table), closing
//! writes it back when something changed.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::gateway::table::Table;
use crate::gateway::{GatewayError, IpvsGateway, IpvsHandle, KernelDestination, KernelService};

/// Gateway reading and writing a table state file.
#[derive(Debug, Clone)]
pub struct StateFileGateway {
    path: PathBuf,
}

impl StateFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Table, GatewayError> {
        if !self.path.exists() {
            return Ok(Table::default());
        }
        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl IpvsGateway for StateFileGateway {
    fn open(&self) -> Result<Box<dyn IpvsHandle>, GatewayError> {
        let table = self.load().map_err(|e| {
            GatewayError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        tracing::trace!(path = %self.path.display(), services = table.entries.len(), "State file opened");
        Ok(Box::new(StateFileHandle {
            path: self.path.clone(),
            table,
            dirty: false,
            closed: false,
        }))
    }
}

/// Open state file. Mutations stay in memory until close.
#[derive(Debug)]
pub struct StateFileHandle {
    path: PathBuf,
    table: Table,
    dirty: bool,
    closed: bool,
}

impl StateFileHandle {
    fn read(&self) -> Result<&Table, GatewayError> {
        if self.closed {
            return Err(GatewayError::Closed);
        }
        Ok(&self.table)
    }

    fn write(&mut self) -> Result<&mut Table, GatewayError> {
        if self.closed {
            return Err(GatewayError::Closed);
        }
        self.dirty = true;
        Ok(&mut self.table)
    }

    fn persist(&self) -> Result<(), GatewayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, &self.table)?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), services = self.table.entries.len(), "State file written");
        Ok(())
    }
}

impl IpvsHandle for StateFileHandle {
    fn list_services(&mut self) -> Result<Vec<KernelService>, GatewayError> {
        Ok(self.read()?.list_services())
    }

    fn get_service(&mut self, service: &KernelService) -> Result<KernelService, GatewayError> {
        self.read()?.get_service(service)
    }

    fn list_destinations(
        &mut self,
        service: &KernelService,
    ) -> Result<Vec<KernelDestination>, GatewayError> {
        self.read()?.list_destinations(service)
    }

    fn create_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.write()?.create_service(service)
    }

    fn update_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.write()?.update_service(service)
    }

    fn delete_service(&mut self, service: &KernelService) -> Result<(), GatewayError> {
        self.write()?.delete_service(service)
    }

    fn create_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        self.write()?.create_destination(service, destination)
    }

    fn update_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        self.write()?.update_destination(service, destination)
    }

    fn delete_destination(
        &mut self,
        service: &KernelService,
        destination: &KernelDestination,
    ) -> Result<(), GatewayError> {
        self.write()?.delete_destination(service, destination)
    }

    fn close(&mut self) -> Result<(), GatewayError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }
}

impl Drop for StateFileHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write state file");
        }
    }
}
