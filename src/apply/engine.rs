//! Change set execution.
//!
//! # Responsibilities
//! - Check every item against the allowed actions before touching the table
//! - Execute items in order through one gateway handle, stopping at the first failure
//!
//! # Data Flow
//! ```text
//! ChangeSet ──► authorize (no side effects) ──► execute item 0..n ──► close handle
//!                    │                               │
//!                    └── Error::Apply (denied)       └── Error::Apply { what, source }
//! ```
//!
//! # Design Decisions
//! - The handle is opened once per change set and released on every return path
//!   (`Drop`); on success it is closed explicitly so close failures surface
//! - No rollback: items applied before a failure stay applied

use std::sync::Arc;

use crate::apply::actions::{AllowedActions, ApplyAction, ApplyOpts};
use crate::changeset::{build_changeset, Change, ChangeKind, ChangeSet, ChangeSetItem};
use crate::error::{Error, Result};
use crate::gateway::{IpvsGateway, IpvsHandle, KernelDestination, KernelService};
use crate::model::types::{Destination, IpvsConfig, Service};

/// Applies change sets to the table behind a gateway.
#[derive(Clone)]
pub struct ApplyEngine {
    gateway: Arc<dyn IpvsGateway>,
}

impl ApplyEngine {
    pub fn new(gateway: Arc<dyn IpvsGateway>) -> Self {
        Self { gateway }
    }

    /// Build the change set from `current` to `target` and apply it.
    pub fn apply(
        &self,
        current: &IpvsConfig,
        target: &IpvsConfig,
        opts: &ApplyOpts,
    ) -> Result<ChangeSet> {
        let cs = build_changeset(current, target, opts.keep_weights)?;
        tracing::debug!(items = cs.len(), "Applying change set");
        self.apply_changeset(target, &cs, opts)?;
        Ok(cs)
    }

    /// Apply `cs`, whose payloads were built against `target`.
    pub fn apply_changeset(
        &self,
        target: &IpvsConfig,
        cs: &ChangeSet,
        opts: &ApplyOpts,
    ) -> Result<()> {
        let mut handle = self.gateway.open().map_err(Error::GatewayUnavailable)?;

        authorize(cs, &opts.allowed_actions)?;

        for (idx, item) in cs.iter().enumerate() {
            tracing::trace!(idx, kind = %item.kind(), description = %item.description, "Applying change set item");
            execute(&mut *handle, target, item)?;
        }

        handle
            .close()
            .map_err(|e| Error::apply("unable to close handle", e))
    }
}

/// Reject the change set if any item is not covered by `allowed`.
fn authorize(cs: &ChangeSet, allowed: &AllowedActions) -> Result<()> {
    for (idx, item) in cs.iter().enumerate() {
        tracing::trace!(idx, kind = %item.kind(), "Checking change set item");

        let kind = item.kind();
        if !allowed.allows(ApplyAction::from(kind)) {
            return Err(Error::denied(match kind {
                ChangeKind::AddService => "not allowed to add a service",
                ChangeKind::UpdateService => "not allowed to update a service",
                ChangeKind::DeleteService => "not allowed to delete a service",
                ChangeKind::AddDestination => "not allowed to add a destination",
                ChangeKind::UpdateDestination => "not allowed to update a destination",
                ChangeKind::DeleteDestination => "not allowed to delete a destination",
            }));
        }

        if let Change::AddService { service } = &item.change {
            if !service.destinations.is_empty() && !allowed.allows(ApplyAction::AddDestination) {
                return Err(Error::denied("not allowed to add a destinations"));
            }
        }
    }
    Ok(())
}

/// Table record of a service that already exists.
fn existing_service(target: &IpvsConfig, service: &Service) -> Result<KernelService> {
    KernelService::for_existing(&target.defaults, service).map_err(|e| {
        Error::apply(format!("unable to prepare service {}", service.address), e)
    })
}

/// Table record of a destination that already exists.
fn existing_destination(target: &IpvsConfig, destination: &Destination) -> Result<KernelDestination> {
    match &destination.origin {
        Some(origin) => Ok(origin.clone()),
        None => KernelDestination::from_model(&target.defaults, destination).map_err(|e| {
            Error::apply(format!("unable to prepare destination {}", destination.address), e)
        }),
    }
}

fn new_destination(target: &IpvsConfig, service: &Service, destination: &Destination) -> Result<KernelDestination> {
    KernelDestination::from_model(&target.defaults, destination).map_err(|e| {
        Error::apply(
            format!("unable to prepare new destination for service {}", service.address),
            e,
        )
    })
}

fn execute(handle: &mut dyn IpvsHandle, target: &IpvsConfig, item: &ChangeSetItem) -> Result<()> {
    match &item.change {
        Change::DeleteService { service } => {
            let record = existing_service(target, service)?;
            tracing::trace!(service = %record, "Removing service");
            handle
                .delete_service(&record)
                .map_err(|e| Error::apply(format!("unable to delete service {}", record), e))?;
        }
        Change::AddService { service } => {
            let record = KernelService::from_model(&target.defaults, service)
                .map_err(|e| Error::apply("unable to add service", e))?;
            tracing::trace!(service = %record, sched = %record.sched_name, "Adding service");
            handle
                .create_service(&record)
                .map_err(|e| Error::apply(format!("unable to add ipvs service {}", record), e))?;

            for destination in &service.destinations {
                let dst = new_destination(target, service, destination)?;
                handle.create_destination(&record, &dst).map_err(|e| {
                    Error::apply(
                        format!("unable to add new destination {} for service {}", dst, record),
                        e,
                    )
                })?;
            }
        }
        Change::UpdateService { service } => {
            let record = KernelService::from_model(&target.defaults, service)
                .map_err(|e| Error::apply("unable to edit service", e))?;
            tracing::trace!(service = %record, sched = %record.sched_name, "Updating service");
            handle
                .update_service(&record)
                .map_err(|e| Error::apply(format!("unable to edit ipvs service {}", record), e))?;
        }
        Change::AddDestination {
            service,
            destination,
        } => {
            let record = existing_service(target, service)?;
            let dst = new_destination(target, service, destination)?;
            tracing::trace!(service = %record, destination = %dst, "Adding destination");
            handle.create_destination(&record, &dst).map_err(|e| {
                Error::apply(
                    format!("unable to add new destination {} for service {}", dst, record),
                    e,
                )
            })?;
        }
        Change::DeleteDestination {
            service,
            destination,
        } => {
            let record = existing_service(target, service)?;
            let dst = existing_destination(target, destination)?;
            tracing::trace!(service = %record, destination = %dst, "Removing destination");
            handle.delete_destination(&record, &dst).map_err(|e| {
                Error::apply(
                    format!("unable to delete destination {} for service {}", dst, record),
                    e,
                )
            })?;
        }
        Change::UpdateDestination {
            service,
            destination,
        } => {
            let record = existing_service(target, service)?;
            let dst = KernelDestination::from_model(&target.defaults, destination).map_err(|e| {
                Error::apply(
                    format!("unable to prepare edited destination for service {}", record),
                    e,
                )
            })?;
            tracing::trace!(service = %record, destination = %dst, weight = dst.weight, "Updating destination");
            handle.update_destination(&record, &dst).map_err(|e| {
                Error::apply(
                    format!("unable to update destination {} for service {}", dst, record),
                    e,
                )
            })?;
        }
    }
    Ok(())
}
