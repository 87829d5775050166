//! Dynamic parameters.
//!
//! Service and destination addresses may contain `${name}` placeholders that
//! are replaced before validation.
//!
//! # Data Flow
//! ```text
//! AppConfig.params ──► sources::build_chain ──► ResolverChain
//!                                                   │
//! IpvsConfig (raw) ──► IpvsConfig::resolve_params ◄─┘ ──► IpvsConfig (literal)
//! ```
//!
//! # Design Decisions
//! - Resolvers are consulted in order; the first one that knows a name wins
//! - Sources: `host.` interface addresses, `env.` variables, files, URLs
//! - An unresolved placeholder aborts the whole pass

pub mod resolver;
pub mod sources;
pub mod substitute;

pub use resolver::{DocumentResolver, MapResolver};
pub use sources::build_chain;
pub use substitute::substitute;

/// Looks up a parameter by name.
pub trait Resolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Ordered list of resolvers.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resolver: impl Resolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    pub fn with(mut self, resolver: impl Resolver + 'static) -> Self {
        self.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Resolver for ResolverChain {
    fn resolve(&self, name: &str) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.resolve(name))
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let chain = ResolverChain::new()
            .with(MapResolver::new().with([("a", "1")]))
            .with(MapResolver::new().with([("a", "2"), ("b", "3")]));

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.resolve("a").as_deref(), Some("1"));
        assert_eq!(chain.resolve("b").as_deref(), Some("3"));
        assert_eq!(chain.resolve("c"), None);
        assert_eq!(ResolverChain::new().resolve("a"), None);
    }
}
