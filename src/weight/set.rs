//! One-shot weight change of a single destination.

use crate::apply::{AllowedActions, ApplyAction, ApplyEngine, ApplyOpts};
use crate::changeset::builder::service_ref;
use crate::changeset::{Change, ChangeSet, ChangeSetItem};
use crate::error::{Error, Result};
use crate::model::equality::{DestinationIdentity, ServiceIdentity};
use crate::model::types::{Destination, IpvsConfig, Service};

/// A destination located in the current configuration by its handles.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTarget {
    /// Service reference without destinations.
    pub service: Service,
    pub destination: Destination,
}

impl WeightTarget {
    /// Find the service and destination denoted by `service` and `destination`
    /// (e.g. `tcp://10.0.0.1:80` and `10.0.0.2:80`).
    pub fn locate(current: &IpvsConfig, service: &str, destination: &str) -> Result<Self> {
        tracing::debug!(service, destination, "Locating");
        let defaults = &current.defaults;

        let wanted = ServiceIdentity::of(defaults, &Service::new(service))
            .map_err(|e| Error::Set(format!("invalid service handle {}: {}", service, e)))?;

        let mut found = None;
        for candidate in &current.services {
            if ServiceIdentity::of(defaults, candidate)?.matches(&wanted) {
                found = Some(candidate);
                break;
            }
        }
        let svc = found.ok_or_else(|| {
            Error::Set(format!(
                "Service {} not found in active ipvs configuration. Try ipvsctl get",
                service
            ))
        })?;
        tracing::trace!(service = %svc.address, "Found service");

        let wanted = DestinationIdentity::of(defaults, &Destination::new(destination))
            .map_err(|e| Error::Set(format!("invalid destination handle {}: {}", destination, e)))?;

        let mut found = None;
        for candidate in &svc.destinations {
            if DestinationIdentity::of(defaults, candidate)?.matches(&wanted) {
                found = Some(candidate);
                break;
            }
        }
        let dst = found.ok_or_else(|| {
            Error::Set(format!(
                "Destination {} not found in active ipvs configuration. Try ipvsctl get",
                destination
            ))
        })?;
        tracing::trace!(destination = %dst.address, "Found destination");

        Ok(Self {
            service: service_ref(defaults, svc),
            destination: dst.clone(),
        })
    }

    /// Weight currently configured, with defaults applied.
    pub fn current_weight(&self, current: &IpvsConfig) -> i32 {
        current.defaults.resolve_weight(self.destination.weight)
    }

    /// Single-item change set setting the weight to `weight`.
    pub fn changeset(&self, weight: i32) -> ChangeSet {
        let mut destination = self.destination.clone();
        destination.weight = Some(weight);

        let mut cs = ChangeSet::new();
        cs.add_change(ChangeSetItem::new(
            Change::UpdateDestination {
                service: self.service.clone(),
                destination,
            },
            format!(
                "Updating weight of destination {} in service {} to {}",
                self.destination.address, self.service.address, weight
            ),
        ));
        cs
    }

    /// Apply `weight` through `engine`, allowing only destination updates.
    pub fn apply(&self, engine: &ApplyEngine, current: &IpvsConfig, weight: i32) -> Result<()> {
        engine.apply_changeset(current, &self.changeset(weight), &update_only())
    }
}

pub(crate) fn update_only() -> ApplyOpts {
    ApplyOpts {
        keep_weights: false,
        allowed_actions: AllowedActions::only([ApplyAction::UpdateDestination]),
    }
}

/// Set the weight of one destination of the current configuration.
pub fn set_weight(
    engine: &ApplyEngine,
    current: &IpvsConfig,
    service: &str,
    destination: &str,
    weight: i32,
) -> Result<()> {
    let target = WeightTarget::locate(current, service, destination)?;
    target.apply(engine, current, weight)?;
    tracing::info!(
        "Updated weight to {} for {}/{}",
        weight,
        target.service.address,
        target.destination.address
    );
    Ok(())
}
