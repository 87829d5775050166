//! Reading the live table into a model.

use crate::error::{Error, Result};
use crate::gateway::{IpvsGateway, IpvsHandle, KernelDestination, KernelService};
use crate::model::address::{render_destination, render_service};
use crate::model::types::{Destination, IpvsConfig, Service};

fn to_destination(destination: KernelDestination) -> Destination {
    let forward = match destination.forward() {
        Some(mode) => Some(mode.to_string()),
        None => {
            tracing::warn!(
                destination = %destination,
                flags = destination.connection_flags,
                "Unknown forwarding method"
            );
            None
        }
    };
    Destination {
        address: render_destination(destination.address, destination.port),
        weight: Some(i32::try_from(destination.weight).unwrap_or(i32::MAX)),
        forward,
        origin: Some(destination),
    }
}

fn to_service(handle: &mut dyn IpvsHandle, service: KernelService) -> Result<Service> {
    let destinations = handle
        .list_destinations(&service)
        .map_err(|source| Error::Query {
            what: format!("destinations of {}", service),
            source,
        })?;

    let address = render_service(service.protocol, service.address, service.port, service.fwmark);
    tracing::trace!(service = %address, destinations = destinations.len(), "Service read");

    Ok(Service {
        address,
        sched_name: Some(service.sched_name.clone()).filter(|s| !s.is_empty()),
        destinations: destinations.into_iter().map(to_destination).collect(),
        origin: Some(service),
    })
}

/// Retrieve all services with their destinations from the live table.
pub fn fetch_current(gateway: &dyn IpvsGateway) -> Result<IpvsConfig> {
    tracing::debug!("Querying ipvs data");

    let mut handle = gateway.open().map_err(Error::GatewayUnavailable)?;

    let listed = handle.list_services().map_err(|source| Error::Query {
        what: "services".into(),
        source,
    })?;

    let mut services = Vec::with_capacity(listed.len());
    for service in listed {
        let service = handle.get_service(&service).map_err(|source| Error::Query {
            what: format!("service {}", service),
            source,
        })?;
        services.push(to_service(&mut *handle, service)?);
    }

    Ok(IpvsConfig::new(services))
}
