//! Kernel-level table records and their construction from the model.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::address::{
    parse_destination_address, parse_service_address, render_destination, render_service,
    ServiceAddress,
};
use crate::model::types::{Defaults, Destination, ForwardMode, Service};

/// A virtual service as stored in the kernel table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelService {
    /// IP protocol number, 0 for firewall-mark services.
    pub protocol: u16,
    pub address: IpAddr,
    pub port: u16,
    pub fwmark: u32,
    pub sched_name: String,
}

impl KernelService {
    /// True if both records address the same table entry.
    pub fn same_entry(&self, other: &KernelService) -> bool {
        self.protocol == other.protocol
            && self.address == other.address
            && self.port == other.port
            && self.fwmark == other.fwmark
    }

    /// Build the record for `service`, resolving omitted fields with `defaults`.
    pub fn from_model(defaults: &Defaults, service: &Service) -> Result<Self> {
        let sched_name = defaults
            .resolve_sched(service.sched_name.as_deref())
            .to_string();

        match parse_service_address(&service.address)? {
            ServiceAddress::FwMark(fwmark) => Ok(Self {
                protocol: 0,
                address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                port: 0,
                fwmark,
                sched_name,
            }),
            ServiceAddress::Inet {
                protocol,
                host,
                port,
            } => {
                let address = host
                    .parse::<IpAddr>()
                    .map_err(|_| Error::parse(&service.address, "host is not an IP address"))?;
                let port = u16::try_from(defaults.resolve_port(port))
                    .map_err(|_| Error::parse(&service.address, "port out of range"))?;
                Ok(Self {
                    protocol: protocol.number(),
                    address,
                    port,
                    fwmark: 0,
                    sched_name,
                })
            }
        }
    }

    /// Record to address an existing service: the live record when known.
    pub fn for_existing(defaults: &Defaults, service: &Service) -> Result<Self> {
        match &service.origin {
            Some(origin) => Ok(origin.clone()),
            None => Self::from_model(defaults, service),
        }
    }
}

impl fmt::Display for KernelService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_service(
            self.protocol,
            self.address,
            self.port,
            self.fwmark,
        ))
    }
}

/// A real server as stored in the kernel table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelDestination {
    pub address: IpAddr,
    pub port: u16,
    pub weight: u32,
    pub connection_flags: u32,
}

impl KernelDestination {
    pub fn same_entry(&self, other: &KernelDestination) -> bool {
        self.address == other.address && self.port == other.port
    }

    pub fn forward(&self) -> Option<ForwardMode> {
        ForwardMode::from_connection_flags(self.connection_flags)
    }

    pub fn from_model(defaults: &Defaults, destination: &Destination) -> Result<Self> {
        let parsed = parse_destination_address(&destination.address)?;
        let address = parsed
            .host
            .parse::<IpAddr>()
            .map_err(|_| Error::parse(&destination.address, "host is not an IP address"))?;
        let port = u16::try_from(defaults.resolve_port(parsed.port))
            .map_err(|_| Error::parse(&destination.address, "port out of range"))?;
        let weight = u32::try_from(defaults.resolve_weight(destination.weight))
            .map_err(|_| Error::parse(&destination.address, "negative weight"))?;
        let forward = defaults.resolve_forward(destination.forward.as_deref())?;

        Ok(Self {
            address,
            port,
            weight,
            connection_flags: forward.connection_flags(),
        })
    }
}

impl fmt::Display for KernelDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_destination(self.address, self.port))
    }
}
