//! Change set construction.
//!
//! # Responsibilities
//! - Compare a current and a target model
//! - Emit the minimal list of structural changes, in three passes:
//!   deletions, additions, then updates of services present on both sides
//!
//! # Design Decisions
//! - Neither model is mutated; emitted items carry clones
//! - Every service address on both sides is parsed up front, so any parse
//!   failure aborts the build before a single item is produced
//! - Matched destinations are paired by raw address string in the update
//!   step, while additions/deletions use identity equality

use crate::error::Result;
use crate::gateway::{KernelDestination, KernelService};
use crate::model::equality::{
    destinations_full_equal, services_full_equal, DestinationIdentity, ServiceIdentity,
};
use crate::model::types::{Defaults, Destination, IpvsConfig, Service};
use crate::changeset::item::{Change, ChangeSet, ChangeSetItem};

/// Reference to a current-side service, pinned to its table record.
pub(crate) fn service_ref(defaults: &Defaults, service: &Service) -> Service {
    Service {
        address: service.address.clone(),
        sched_name: service.sched_name.clone(),
        destinations: Vec::new(),
        origin: KernelService::for_existing(defaults, service).ok(),
    }
}

/// Reference to a current-side destination, pinned to its table record.
fn destination_ref(defaults: &Defaults, destination: &Destination) -> Destination {
    let mut pinned = destination.clone();
    if pinned.origin.is_none() {
        pinned.origin = KernelDestination::from_model(defaults, destination).ok();
    }
    pinned
}

/// Target-side service without its destinations.
fn service_only(service: &Service) -> Service {
    Service {
        destinations: Vec::new(),
        ..service.clone()
    }
}

fn identities(defaults: &Defaults, services: &[Service]) -> Result<Vec<ServiceIdentity>> {
    services
        .iter()
        .map(|s| ServiceIdentity::of(defaults, s))
        .collect()
}

fn destination_identities(
    defaults: &Defaults,
    destinations: &[Destination],
) -> Result<Vec<DestinationIdentity>> {
    destinations
        .iter()
        .map(|d| DestinationIdentity::of(defaults, d))
        .collect()
}

/// Build the change set that transforms `current` into `target`.
///
/// With `keep_weights` set, weight differences alone never produce an update,
/// and updates that are emitted carry the current weight.
pub fn build_changeset(
    current: &IpvsConfig,
    target: &IpvsConfig,
    keep_weights: bool,
) -> Result<ChangeSet> {
    let mut cs = ChangeSet::new();

    let current_ids = identities(&current.defaults, &current.services)?;
    let target_ids = identities(&target.defaults, &target.services)?;

    // 1: services that exist now but not in the target are removed
    for (service, id) in current.services.iter().zip(&current_ids) {
        let found = target_ids.iter().any(|t| t.matches(id));
        tracing::trace!(active_service = %service.address, in_new_config = found, "Checking service");

        if !found {
            let reference = service_ref(&current.defaults, service);
            let address = reference
                .origin
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| service.address.clone());
            cs.add_change(ChangeSetItem::new(
                Change::DeleteService { service: reference },
                format!(
                    "Delete existing service {} because it does not exist in updated model any more",
                    address
                ),
            ));
        }
    }

    // 2: services in the target that do not exist yet are added with all destinations
    for (service, id) in target.services.iter().zip(&target_ids) {
        if !current_ids.iter().any(|c| c.matches(id)) {
            cs.add_change(ChangeSetItem::new(
                Change::AddService {
                    service: service.clone(),
                },
                format!("Adding new service {} because it does not yet exist", service.address),
            ));
        }
    }

    // 3: services on both sides are compared in detail
    for (service, id) in current.services.iter().zip(&current_ids) {
        for (new_service, new_id) in target.services.iter().zip(&target_ids) {
            if !id.matches(new_id) {
                continue;
            }
            update_service(current, service, target, new_service, keep_weights, &mut cs)?;
        }
    }

    tracing::debug!(items = cs.len(), keep_weights, "Change set built");
    Ok(cs)
}

fn update_service(
    current: &IpvsConfig,
    service: &Service,
    target: &IpvsConfig,
    new_service: &Service,
    keep_weights: bool,
    cs: &mut ChangeSet,
) -> Result<()> {
    if !services_full_equal(&current.defaults, service, &target.defaults, new_service)? {
        cs.add_change(ChangeSetItem::new(
            Change::UpdateService {
                service: service_only(new_service),
            },
            format!(
                "Updating existing service {} because details have changed",
                new_service.address
            ),
        ));
    }

    let reference = service_ref(&current.defaults, service);
    let service_address = reference
        .origin
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| service.address.clone());

    let current_ids = destination_identities(&current.defaults, &service.destinations)?;
    let target_ids = destination_identities(&target.defaults, &new_service.destinations)?;

    // a: destinations gone from the target are removed
    for (destination, id) in service.destinations.iter().zip(&current_ids) {
        if !target_ids.iter().any(|t| t.matches(id)) {
            let pinned = destination_ref(&current.defaults, destination);
            let address = pinned
                .origin
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| destination.address.clone());
            cs.add_change(ChangeSetItem::new(
                Change::DeleteDestination {
                    service: reference.clone(),
                    destination: pinned,
                },
                format!(
                    "Delete existing destination {} in service {} because it does not exist in updated model any more",
                    address, service_address
                ),
            ));
        }
    }

    // b: destinations new in the target are added
    for (new_destination, id) in new_service.destinations.iter().zip(&target_ids) {
        if !current_ids.iter().any(|c| c.matches(id)) {
            cs.add_change(ChangeSetItem::new(
                Change::AddDestination {
                    service: reference.clone(),
                    destination: new_destination.clone(),
                },
                format!(
                    "Adding new destination {} to service {} because it does not yet exist",
                    new_destination.address, service_address
                ),
            ));
        }
    }

    // c: destinations on both sides, paired by address string, are updated when they differ
    for destination in &service.destinations {
        for new_destination in &new_service.destinations {
            if destination.address != new_destination.address {
                continue;
            }
            let equal = destinations_full_equal(
                &current.defaults,
                destination,
                &target.defaults,
                new_destination,
                keep_weights,
            )?;
            if equal {
                continue;
            }

            let mut updated = new_destination.clone();
            if keep_weights {
                updated.weight = Some(current.defaults.resolve_weight(destination.weight));
            }
            cs.add_change(ChangeSetItem::new(
                Change::UpdateDestination {
                    service: reference.clone(),
                    destination: updated,
                },
                format!(
                    "Updating existing destination {} in service {} because details have changed",
                    new_destination.address, service_address
                ),
            ));
        }
    }

    Ok(())
}

impl IpvsConfig {
    /// Change set from this (current) configuration to `target`.
    pub fn changeset(&self, target: &IpvsConfig, keep_weights: bool) -> Result<ChangeSet> {
        build_changeset(self, target, keep_weights)
    }
}
