//! Concrete resolvers.

use std::collections::HashMap;
use std::net::IpAddr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::params::Resolver;

/// Prefix under which environment variables are exposed.
pub const ENV_PREFIX: &str = "env.";

/// Prefix under which local interface addresses are exposed.
pub const HOST_PREFIX: &str = "host.";

/// Fixed name/value pairs.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    values: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add pairs; later pairs overwrite earlier ones with the same name.
    pub fn with<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Snapshot of the process environment as `env.NAME`.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self::new().with(
            vars.into_iter()
                .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v)),
        )
    }

    /// Addresses of the local network interfaces.
    pub fn from_host_network() -> Result<Self> {
        let interfaces = if_addrs::get_if_addrs()
            .map_err(|e| Error::Params(format!("unable to query network interfaces: {}", e)))?;
        Ok(Self::from_interfaces(
            interfaces.into_iter().map(|intf| {
                let ip = intf.ip();
                (intf.name, ip)
            }),
        ))
    }

    /// `host.NAME` holds the first address of an interface, `host.NAME_N`
    /// the N-th one counting from zero.
    pub fn from_interfaces(addrs: impl IntoIterator<Item = (String, IpAddr)>) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut resolver = Self::new();
        for (name, ip) in addrs {
            let idx = seen.entry(name.clone()).or_insert(0);
            let value = ip.to_string();
            if *idx == 0 {
                resolver
                    .values
                    .insert(format!("{}{}", HOST_PREFIX, name), value.clone());
            }
            resolver
                .values
                .insert(format!("{}{}_{}", HOST_PREFIX, name, idx), value);
            *idx += 1;
        }
        resolver
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Resolver for MapResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// A JSON or YAML document looked up by dotted path (`a.b.0.c`).
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    root: Value,
}

impl DocumentResolver {
    pub fn from_json(data: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(data)
            .map_err(|e| Error::Params(format!("invalid json document: {}", e)))?;
        Self::from_value(root)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(data)
            .map_err(|e| Error::Params(format!("invalid yaml document: {}", e)))?;
        Self::from_value(root)
    }

    /// JSON first, then YAML. The document must be a mapping.
    pub fn from_data(origin: &str, data: &str) -> Result<Self> {
        Self::from_json(data)
            .or_else(|_| Self::from_yaml(data))
            .map_err(|_| Error::Params(format!("{} must be JSON or YAML", origin)))
    }

    fn from_value(root: Value) -> Result<Self> {
        if !root.is_object() {
            return Err(Error::Params("parameter document must be a mapping".into()));
        }
        Ok(Self { root })
    }
}

impl Resolver for DocumentResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        let mut node = &self.root;
        for part in name.split('.') {
            node = match node {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match node {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
