//! Structural validation of a configuration.
//!
//! # Responsibilities
//! - Check defaults, service addresses, schedulers and destinations
//! - Write defaults into services and destinations that omit a field
//!
//! # Design Decisions
//! - Stops at the first violation, checks run in a fixed order
//! - Uniqueness is by resolved identity, not by raw string
//! - IPv6 is rejected outright

use std::net::{IpAddr, Ipv4Addr};

use crate::error::{Error, Result};
use crate::model::address::{parse_destination_address, parse_service_address, ServiceAddress};
use crate::model::equality::{DestinationIdentity, ServiceIdentity};
use crate::model::types::{Defaults, ForwardMode, IpvsConfig, MAX_U16_VALUE, SCHEDULERS};

fn invalid(reason: impl Into<String>) -> Error {
    Error::Validation(reason.into())
}

fn check_ipv4(host: &str, context: &str) -> Result<Ipv4Addr> {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(_)) => Err(invalid(format!(
            "unable to parse address ({}){}, IPv6 not supported",
            host, context
        ))),
        Err(_) => Err(invalid(format!(
            "unable to parse address ({}){}, not an IP address",
            host, context
        ))),
    }
}

fn check_defaults(defaults: &Defaults) -> Result<()> {
    if let Some(port) = defaults.port {
        if !(1..=MAX_U16_VALUE).contains(&i64::from(port)) {
            return Err(invalid(format!("default port out of range: {}", port)));
        }
    }
    if let Some(weight) = defaults.weight {
        if !(0..=MAX_U16_VALUE).contains(&i64::from(weight)) {
            return Err(invalid(format!("default weight out of range: {}", weight)));
        }
    }
    if let Some(sched) = &defaults.sched_name {
        if !SCHEDULERS.contains(&sched.as_str()) {
            return Err(invalid(format!("invalid default scheduler: {}", sched)));
        }
    }
    if let Some(forward) = &defaults.forward {
        if !ForwardMode::NAMES.contains(&forward.as_str()) {
            return Err(invalid(format!(
                "invalid default forward: {}, allowed forwards are direct,nat,tunnel",
                forward
            )));
        }
    }
    Ok(())
}

impl IpvsConfig {
    /// Check the configuration for structural errors.
    ///
    /// Services without a scheduler and destinations without forward mode or
    /// weight receive the corresponding default, if one is set.
    pub fn validate(&mut self) -> Result<()> {
        check_defaults(&self.defaults)?;

        let defaults = self.defaults.clone();
        let mut seen_services: Vec<ServiceIdentity> = Vec::with_capacity(self.services.len());

        for service in &mut self.services {
            if service.address.is_empty() {
                return Err(invalid("service address may not be empty"));
            }

            let parsed = parse_service_address(&service.address).map_err(|_| {
                invalid(format!(
                    "unable to parse address ({}), must be of format <proto>://<host>[:port] or fwmark:<id>",
                    service.address
                ))
            })?;

            let identity = ServiceIdentity::of(&defaults, service)?;
            if seen_services.iter().any(|s| s.matches(&identity)) {
                return Err(invalid(format!(
                    "service addresses must be unique: {}",
                    service.address
                )));
            }
            seen_services.push(identity);

            match &parsed {
                ServiceAddress::FwMark(mark) => {
                    if !(1..=MAX_U16_VALUE).contains(&i64::from(*mark)) {
                        return Err(invalid(format!(
                            "unable to parse address ({}), invalid fwmark number",
                            service.address
                        )));
                    }
                }
                ServiceAddress::Inet { host, .. } => {
                    check_ipv4(host, "")?;
                }
            }

            if service.sched_name.as_deref().map_or(true, str::is_empty) {
                service.sched_name = defaults.sched_name.clone();
            }
            if let Some(sched) = &service.sched_name {
                if !SCHEDULERS.contains(&sched.as_str()) {
                    return Err(invalid(format!(
                        "invalid scheduler ({}) for service ({})",
                        sched, service.address
                    )));
                }
            }

            let mut seen_destinations: Vec<DestinationIdentity> =
                Vec::with_capacity(service.destinations.len());

            for destination in &mut service.destinations {
                if destination.address.is_empty() {
                    return Err(invalid(format!(
                        "destination address may not be empty for service {}",
                        service.address
                    )));
                }

                let parsed = parse_destination_address(&destination.address).map_err(|_| {
                    invalid(format!(
                        "unable to parse address ({}) for service {}, check host and port",
                        destination.address, service.address
                    ))
                })?;

                let identity = DestinationIdentity::of(&defaults, destination)?;
                if seen_destinations.iter().any(|d| d.matches(&identity)) {
                    return Err(invalid(format!(
                        "destination addresses must be unique per service: {} in service {}",
                        destination.address, service.address
                    )));
                }
                seen_destinations.push(identity);

                check_ipv4(&parsed.host, &format!(" for service {}", service.address))?;

                let port = defaults.resolve_port(parsed.port);
                if !(1..=MAX_U16_VALUE).contains(&i64::from(port)) {
                    return Err(invalid(format!(
                        "invalid port ({}) for destination {} in service {}",
                        port, destination.address, service.address
                    )));
                }

                if destination.forward.as_deref().map_or(true, str::is_empty) {
                    destination.forward = defaults.forward.clone();
                }
                if let Some(forward) = &destination.forward {
                    if !ForwardMode::NAMES.contains(&forward.as_str()) {
                        return Err(invalid(format!(
                            "invalid forward ({}) for destination {} in service {}, allowed are direct,nat,tunnel",
                            forward, destination.address, service.address
                        )));
                    }
                }

                if destination.weight.is_none() {
                    destination.weight = defaults.weight;
                }
                if let Some(weight) = destination.weight {
                    if !(0..=MAX_U16_VALUE).contains(&i64::from(weight)) {
                        return Err(invalid(format!(
                            "invalid weight ({}) for destination {} in service {}",
                            weight, destination.address, service.address
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
