//! Shared fixtures for integration tests.

use std::io::Write;
use std::sync::Arc;

use ipvsctl::gateway::{fetch_current, MemoryGateway};
use ipvsctl::{ApplyEngine, IpvsConfig};

/// Parse and validate a model, panicking on error.
pub fn model(yaml: &str) -> IpvsConfig {
    let mut config = IpvsConfig::from_yaml(yaml).unwrap();
    config.validate().unwrap();
    config
}

/// A fresh in-memory gateway with an engine driving it.
pub fn engine() -> (MemoryGateway, ApplyEngine) {
    let gateway = MemoryGateway::new();
    let engine = ApplyEngine::new(Arc::new(gateway.clone()));
    (gateway, engine)
}

/// Snapshot of the live table as a model.
pub fn current(gateway: &MemoryGateway) -> IpvsConfig {
    fetch_current(gateway).unwrap()
}

/// Write `content` to a temporary file.
#[allow(dead_code)]
pub fn temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Two services, three destinations.
#[allow(dead_code)]
pub const WEB: &str = r#"
defaults:
  sched: wrr
services:
- address: tcp://10.1.0.1:80
  destinations:
  - address: 10.1.1.1:8080
    weight: 10
  - address: 10.1.1.2:8080
    weight: 20
- address: udp://10.1.0.1:53
  sched: rr
  destinations:
  - address: 10.1.2.1:53
    forward: direct
"#;
