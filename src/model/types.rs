//! Configuration model: services, destinations and defaults.
//!
//! All types derive Serde traits so the same structs serve the YAML input,
//! the `get` output and the change set output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gateway::{KernelDestination, KernelService};

/// Scheduler names accepted by the kernel table.
pub const SCHEDULERS: [&str; 10] = [
    "rr", "wrr", "lc", "wlc", "lblc", "lblcr", "dh", "sh", "sed", "nq",
];

/// Scheduler used when neither the service nor the defaults name one.
pub const DEFAULT_SCHEDULER: &str = "rr";

/// Weight used when neither the destination nor the defaults give one.
pub const DEFAULT_WEIGHT: i32 = 1;

/// Upper bound for ports, weights and firewall marks.
pub const MAX_U16_VALUE: i64 = 65535;

/// Packet forwarding method of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Direct routing (gatewaying).
    Direct,
    /// IP-in-IP tunneling.
    Tunnel,
    /// Masquerading.
    Nat,
}

impl ForwardMode {
    /// Forward mode assumed when nothing is configured. Equals zeroed kernel flags.
    pub const DEFAULT: ForwardMode = ForwardMode::Nat;

    pub const NAMES: [&'static str; 3] = ["direct", "nat", "tunnel"];

    /// Kernel connection flags for this mode.
    pub fn connection_flags(self) -> u32 {
        match self {
            ForwardMode::Direct => 0x03,
            ForwardMode::Tunnel => 0x02,
            ForwardMode::Nat => 0x00,
        }
    }

    /// Map kernel connection flags to a mode, `None` for unknown methods.
    pub fn from_connection_flags(flags: u32) -> Option<Self> {
        match flags & 0x07 {
            0x03 => Some(ForwardMode::Direct),
            0x02 => Some(ForwardMode::Tunnel),
            0x00 => Some(ForwardMode::Nat),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ForwardMode::Direct => "direct",
            ForwardMode::Tunnel => "tunnel",
            ForwardMode::Nat => "nat",
        }
    }
}

impl fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForwardMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(ForwardMode::Direct),
            "tunnel" => Ok(ForwardMode::Tunnel),
            "nat" => Ok(ForwardMode::Nat),
            other => Err(Error::Validation(format!(
                "invalid forward {}, allowed are direct,nat,tunnel",
                other
            ))),
        }
    }
}

/// Values applied wherever a service or destination omits a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,

    #[serde(rename = "sched", skip_serializing_if = "Option::is_none")]
    pub sched_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
}

impl Defaults {
    pub fn is_empty(&self) -> bool {
        self == &Defaults::default()
    }
}

/// A virtual service of the load balancing table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Service {
    /// `<proto>://<host>[:port]` or `fwmark:<id>`.
    #[serde(default)]
    pub address: String,

    #[serde(rename = "sched", default, skip_serializing_if = "Option::is_none")]
    pub sched_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destinations: Vec<Destination>,

    /// Record this service was read from, when it came from the live table.
    #[serde(skip)]
    pub origin: Option<KernelService>,
}

impl Service {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_sched(mut self, sched: impl Into<String>) -> Self {
        self.sched_name = Some(sched.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destinations.push(destination);
        self
    }
}

/// A real server behind a service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Destination {
    /// `host[:port]`.
    #[serde(default)]
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,

    /// Record this destination was read from, when it came from the live table.
    #[serde(skip)]
    pub origin: Option<KernelDestination>,
}

impl Destination {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_forward(mut self, forward: ForwardMode) -> Self {
        self.forward = Some(forward.to_string());
        self
    }
}

/// Root aggregate: one complete table description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IpvsConfig {
    #[serde(skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,
}

impl IpvsConfig {
    pub fn new(services: Vec<Service>) -> Self {
        Self {
            defaults: Defaults::default(),
            services,
        }
    }

    /// Parse a configuration from YAML. Empty input is an empty configuration.
    pub fn from_yaml(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_mode_flags() {
        for mode in [ForwardMode::Direct, ForwardMode::Tunnel, ForwardMode::Nat] {
            assert_eq!(ForwardMode::from_connection_flags(mode.connection_flags()), Some(mode));
            assert_eq!(mode.as_str().parse::<ForwardMode>().unwrap(), mode);
        }
        assert_eq!(ForwardMode::from_connection_flags(0x01), None);
        assert!("gatewaying".parse::<ForwardMode>().is_err());
    }

    #[test]
    fn test_yaml_model() {
        let config = IpvsConfig::from_yaml(
            r#"
defaults:
  port: 8080
  sched: wrr
services:
- address: tcp://127.0.0.1:9876
  sched: rr
  destinations:
  - address: 127.0.0.2:1234
    weight: 0
    forward: nat
  - address: 127.0.0.3
"#,
        )
        .unwrap();

        assert_eq!(config.defaults.port, Some(8080));
        assert_eq!(config.defaults.sched_name.as_deref(), Some("wrr"));
        let service = &config.services[0];
        assert_eq!(service.sched_name.as_deref(), Some("rr"));
        assert_eq!(service.destinations[0].weight, Some(0));
        assert_eq!(service.destinations[1].weight, None);
        assert_eq!(service.destinations[1].forward, None);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(IpvsConfig::from_yaml("").unwrap(), IpvsConfig::default());
        assert_eq!(IpvsConfig::from_yaml("{}").unwrap(), IpvsConfig::default());
        assert!(IpvsConfig::from_yaml("services: 12").is_err());
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let config = IpvsConfig::new(vec![Service::new("fwmark:7")
            .with_destination(Destination::new("10.0.0.1:80").with_weight(5))]);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("defaults"));
        assert!(!yaml.contains("sched"));
        assert!(yaml.contains("weight: 5"));
    }
}
