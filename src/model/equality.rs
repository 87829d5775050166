//! Identity and full equality of services and destinations.
//!
//! # Responsibilities
//! - Decide whether two entities denote the same table entry (identity)
//! - Decide whether a matched pair needs an update (full equality)
//!
//! # Design Decisions
//! - Each side is resolved against its own `Defaults`
//! - All predicates are symmetric
//! - A parse failure on either side is an error, never "not equal"

use crate::error::Result;
use crate::model::address::{parse_destination_address, parse_service_address, same_host, Protocol, ServiceAddress};
use crate::model::types::{Defaults, Destination, Service};

/// Service identity after port resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceIdentity {
    FwMark(u32),
    Inet {
        protocol: Protocol,
        host: String,
        port: i32,
    },
}

impl ServiceIdentity {
    /// Resolve the identity of `service` using `defaults`.
    pub fn of(defaults: &Defaults, service: &Service) -> Result<Self> {
        Ok(match parse_service_address(&service.address)? {
            ServiceAddress::FwMark(mark) => ServiceIdentity::FwMark(mark),
            ServiceAddress::Inet {
                protocol,
                host,
                port,
            } => ServiceIdentity::Inet {
                protocol,
                host,
                port: defaults.resolve_port(port),
            },
        })
    }

    pub fn matches(&self, other: &ServiceIdentity) -> bool {
        match (self, other) {
            (ServiceIdentity::FwMark(a), ServiceIdentity::FwMark(b)) => *a != 0 && a == b,
            (
                ServiceIdentity::Inet {
                    protocol: pa,
                    host: ha,
                    port: oa,
                },
                ServiceIdentity::Inet {
                    protocol: pb,
                    host: hb,
                    port: ob,
                },
            ) => pa == pb && oa == ob && same_host(ha, hb),
            _ => false,
        }
    }
}

/// Destination identity after port resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationIdentity {
    pub host: String,
    pub port: i32,
}

impl DestinationIdentity {
    pub fn of(defaults: &Defaults, destination: &Destination) -> Result<Self> {
        let parsed = parse_destination_address(&destination.address)?;
        Ok(Self {
            host: parsed.host,
            port: defaults.resolve_port(parsed.port),
        })
    }

    pub fn matches(&self, other: &DestinationIdentity) -> bool {
        self.port == other.port && same_host(&self.host, &other.host)
    }
}

/// True if both services denote the same table entry.
pub fn services_identity_equal(
    defaults_a: &Defaults,
    a: &Service,
    defaults_b: &Defaults,
    b: &Service,
) -> Result<bool> {
    let ia = ServiceIdentity::of(defaults_a, a)?;
    let ib = ServiceIdentity::of(defaults_b, b)?;
    Ok(ia.matches(&ib))
}

/// Identity equality plus equal resolved scheduler.
pub fn services_full_equal(
    defaults_a: &Defaults,
    a: &Service,
    defaults_b: &Defaults,
    b: &Service,
) -> Result<bool> {
    if !services_identity_equal(defaults_a, a, defaults_b, b)? {
        return Ok(false);
    }
    Ok(defaults_a.resolve_sched(a.sched_name.as_deref())
        == defaults_b.resolve_sched(b.sched_name.as_deref()))
}

/// True if both destinations denote the same real server.
pub fn destinations_identity_equal(
    defaults_a: &Defaults,
    a: &Destination,
    defaults_b: &Defaults,
    b: &Destination,
) -> Result<bool> {
    let ia = DestinationIdentity::of(defaults_a, a)?;
    let ib = DestinationIdentity::of(defaults_b, b)?;
    Ok(ia.matches(&ib))
}

/// Identity equality plus equal forward mode and, unless `keep_weights`, equal weight.
pub fn destinations_full_equal(
    defaults_a: &Defaults,
    a: &Destination,
    defaults_b: &Defaults,
    b: &Destination,
    keep_weights: bool,
) -> Result<bool> {
    if !destinations_identity_equal(defaults_a, a, defaults_b, b)? {
        return Ok(false);
    }
    if defaults_a.resolve_forward(a.forward.as_deref())?
        != defaults_b.resolve_forward(b.forward.as_deref())?
    {
        return Ok(false);
    }
    if keep_weights {
        return Ok(true);
    }
    Ok(defaults_a.resolve_weight(a.weight) == defaults_b.resolve_weight(b.weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ForwardMode;

    fn none() -> Defaults {
        Defaults::default()
    }

    fn with_port(port: i32) -> Defaults {
        Defaults {
            port: Some(port),
            ..Default::default()
        }
    }

    #[test]
    fn test_service_identity_uses_each_sides_defaults() {
        let a = Service::new("tcp://10.0.0.1:80");
        let b = Service::new("tcp://10.0.0.1");
        assert!(services_identity_equal(&none(), &a, &with_port(80), &b).unwrap());
        assert!(services_identity_equal(&with_port(80), &b, &none(), &a).unwrap());
        assert!(!services_identity_equal(&none(), &a, &with_port(81), &b).unwrap());
        assert!(!services_identity_equal(&none(), &a, &none(), &b).unwrap());
    }

    #[test]
    fn test_service_identity_protocol_and_fwmark() {
        let tcp = Service::new("tcp://10.0.0.1:80");
        let udp = Service::new("udp://10.0.0.1:80");
        let mark = Service::new("fwmark:80");
        assert!(!services_identity_equal(&none(), &tcp, &none(), &udp).unwrap());
        assert!(!services_identity_equal(&none(), &tcp, &none(), &mark).unwrap());
        assert!(services_identity_equal(&none(), &mark, &none(), &Service::new("fwmark:80/")).unwrap());
        assert!(!services_identity_equal(&none(), &mark, &none(), &Service::new("fwmark:81")).unwrap());

        let zero = Service::new("fwmark:0");
        assert!(!services_identity_equal(&none(), &zero, &none(), &zero).unwrap());
    }

    #[test]
    fn test_service_full_equality_scheduler_defaults() {
        let current = Service::new("tcp://10.0.0.1:80");
        let target = Service::new("tcp://10.0.0.1:80");
        let rr = Defaults {
            sched_name: Some("rr".into()),
            ..Default::default()
        };
        assert!(services_full_equal(&none(), &current, &rr, &target).unwrap());

        let wrr = Defaults {
            sched_name: Some("wrr".into()),
            ..Default::default()
        };
        assert!(!services_full_equal(&none(), &current, &wrr, &target).unwrap());
        assert!(services_full_equal(&none(), &current.clone().with_sched("wrr"), &wrr, &target).unwrap());
    }

    #[test]
    fn test_parse_error_propagates() {
        let ok = Service::new("tcp://10.0.0.1:80");
        let bad = Service::new("bogus");
        assert!(services_identity_equal(&none(), &ok, &none(), &bad).is_err());
        assert!(destinations_identity_equal(
            &none(),
            &Destination::new("a:b:c"),
            &none(),
            &Destination::new("10.0.0.1:80")
        )
        .is_err());
    }

    #[test]
    fn test_destination_equality() {
        let a = Destination::new("10.0.0.2:80").with_weight(100).with_forward(ForwardMode::Nat);
        let b = Destination::new("10.0.0.2").with_weight(200).with_forward(ForwardMode::Nat);

        assert!(destinations_identity_equal(&none(), &a, &with_port(80), &b).unwrap());
        assert!(!destinations_full_equal(&none(), &a, &with_port(80), &b, false).unwrap());
        assert!(destinations_full_equal(&none(), &a, &with_port(80), &b, true).unwrap());

        let tunnel = b.clone().with_forward(ForwardMode::Tunnel);
        assert!(!destinations_full_equal(&none(), &a, &with_port(80), &tunnel, true).unwrap());
    }

    #[test]
    fn test_destination_default_weight() {
        let unset = Destination::new("10.0.0.2:80");
        let one = Destination::new("10.0.0.2:80").with_weight(1);
        assert!(destinations_full_equal(&none(), &unset, &none(), &one, false).unwrap());
        assert!(destinations_full_equal(&none(), &one, &none(), &unset, false).unwrap());

        let weighted = Defaults {
            weight: Some(5),
            ..Default::default()
        };
        assert!(!destinations_full_equal(&none(), &one, &weighted, &unset, false).unwrap());
    }
}
