//! Address grammar for services and destinations.
//!
//! # Responsibilities
//! - Parse `<proto>://<host>[:<port>]` and `fwmark:<id>` service addresses
//! - Parse `host[:port]` destination addresses
//! - Render kernel-side records back into the canonical string forms
//!
//! # Design Decisions
//! - Pure functions, no I/O and no defaults: a missing port parses as 0
//! - Hosts are not required to be IP addresses here; the validator decides that
//! - More than one colon in a host/port pair is rejected (no IPv6)

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Transport protocol of an address-based service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    /// IP protocol number as used by the kernel table.
    pub fn number(self) -> u16 {
        match self {
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Sctp => 132,
        }
    }

    /// Map a kernel protocol number back to a protocol.
    pub fn from_number(number: u16) -> Option<Self> {
        match number {
            6 => Some(Protocol::Tcp),
            17 => Some(Protocol::Udp),
            132 => Some(Protocol::Sctp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            other => Err(Error::parse(s, format!("unknown protocol {:?}", other))),
        }
    }
}

/// A parsed service address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceAddress {
    /// Firewall-mark based service.
    FwMark(u32),
    /// Protocol/host/port based service. Port 0 means "not given".
    Inet {
        protocol: Protocol,
        host: String,
        port: u16,
    },
}

impl FromStr for ServiceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_service_address(s)
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAddress::FwMark(mark) => write!(f, "fwmark:{}", mark),
            ServiceAddress::Inet {
                protocol,
                host,
                port: 0,
            } => write!(f, "{}://{}", protocol, host),
            ServiceAddress::Inet {
                protocol,
                host,
                port,
            } => write!(f, "{}://{}:{}", protocol, host, port),
        }
    }
}

/// A parsed destination address. Port 0 means "not given".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for DestinationAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_destination_address(s)
    }
}

impl fmt::Display for DestinationAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == 0 {
            f.write_str(&self.host)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn trim_address(s: &str) -> &str {
    s.trim().trim_end_matches(|c| c == '/' || c == ' ')
}

/// Split `host[:port]`, returning port 0 when absent.
fn split_host_port<'a>(input: &str, hostport: &'a str) -> Result<(&'a str, u16)> {
    let (host, port) = match hostport.split_once(':') {
        None => (hostport, 0),
        Some((_, rest)) if rest.contains(':') => {
            return Err(Error::parse(input, "too many colons, IPv6 is not supported"));
        }
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| Error::parse(input, format!("invalid port {:?}", port)))?;
            (host, port)
        }
    };
    if host.is_empty() {
        return Err(Error::parse(input, "empty host"));
    }
    Ok((host, port))
}

/// Parse a service address in either `fwmark:<id>` or `<proto>://<host>[:<port>]` form.
pub fn parse_service_address(s: &str) -> Result<ServiceAddress> {
    let trimmed = trim_address(s);

    if let Some(mark) = trimmed.strip_prefix("fwmark:") {
        let mark = mark
            .parse::<u32>()
            .map_err(|_| Error::parse(s, format!("invalid fwmark {:?}", mark)))?;
        return Ok(ServiceAddress::FwMark(mark));
    }

    let (proto, hostport) = trimmed.split_once("://").ok_or_else(|| {
        Error::parse(s, "must be of format <proto>://<host>[:port] or fwmark:<id>")
    })?;
    let protocol = proto.parse::<Protocol>().map_err(|_| {
        Error::parse(s, format!("unknown protocol {:?}, expected tcp, udp or sctp", proto))
    })?;
    let (host, port) = split_host_port(s, hostport)?;

    Ok(ServiceAddress::Inet {
        protocol,
        host: host.to_string(),
        port,
    })
}

/// Parse a destination address of the form `host[:port]`.
pub fn parse_destination_address(s: &str) -> Result<DestinationAddress> {
    let (host, port) = split_host_port(s, trim_address(s))?;
    Ok(DestinationAddress {
        host: host.to_string(),
        port,
    })
}

/// Render a kernel service record as an address string.
///
/// A non-zero protocol yields `<proto>://<ip>[:<port>]`, anything else is
/// rendered as `fwmark:<id>`. Unknown protocol numbers render as `N/A`.
pub fn render_service(protocol: u16, address: IpAddr, port: u16, fwmark: u32) -> String {
    if protocol == 0 {
        return format!("fwmark:{}", fwmark);
    }
    let proto = Protocol::from_number(protocol)
        .map(Protocol::as_str)
        .unwrap_or("N/A");
    if port == 0 {
        format!("{}://{}", proto, address)
    } else {
        format!("{}://{}:{}", proto, address, port)
    }
}

/// Render a kernel destination record as `ip:port`.
pub fn render_destination(address: IpAddr, port: u16) -> String {
    format!("{}:{}", address, port)
}

/// Compare two hosts, treating equal IP addresses in different spellings as equal.
pub fn same_host(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}
