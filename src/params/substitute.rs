//! Placeholder substitution.

use crate::error::{Error, Result};
use crate::model::types::{Destination, IpvsConfig, Service};
use crate::params::Resolver;

const OPEN: &str = "${";
const CLOSE: char = '}';

/// Replace every `${name}` in `input` with the value `resolver` yields for `name`.
pub fn substitute(input: &str, resolver: &dyn Resolver) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let end = after
            .find(CLOSE)
            .ok_or_else(|| Error::Params(format!("unterminated placeholder in {:?}", input)))?;

        let name = after[..end].trim();
        if name.is_empty() {
            return Err(Error::Params(format!("empty placeholder in {:?}", input)));
        }
        let value = resolver
            .resolve(name)
            .ok_or_else(|| Error::Params(format!("unresolved parameter {:?} in {:?}", name, input)))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_address(kind: &str, address: &str, resolver: &dyn Resolver) -> Result<String> {
    let resolved = substitute(address, resolver)?;
    if resolved != address {
        tracing::debug!(from = %address, to = %resolved, "Resolved {} address", kind);
    }
    Ok(resolved)
}

impl IpvsConfig {
    /// Copy of this configuration with placeholders in all addresses substituted.
    pub fn resolve_params(&self, resolver: &dyn Resolver) -> Result<IpvsConfig> {
        let services = self
            .services
            .iter()
            .map(|service| {
                let destinations = service
                    .destinations
                    .iter()
                    .map(|destination| {
                        Ok(Destination {
                            address: resolve_address("destination", &destination.address, resolver)?,
                            ..destination.clone()
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Service {
                    address: resolve_address("service", &service.address, resolver)?,
                    destinations,
                    ..service.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(IpvsConfig {
            defaults: self.defaults.clone(),
            services,
        })
    }
}
