//! Effective value resolution.
//!
//! Every place that reads a field for comparison or to build a kernel record
//! goes through one of these functions, so each side of a comparison resolves
//! against its own `Defaults`.

use crate::error::Result;
use crate::model::types::{Defaults, ForwardMode, DEFAULT_SCHEDULER, DEFAULT_WEIGHT};

impl Defaults {
    /// Explicit non-zero port, else the default port, else 0.
    pub fn resolve_port(&self, port: u16) -> i32 {
        if port != 0 {
            i32::from(port)
        } else {
            self.port.unwrap_or(0)
        }
    }

    /// Explicit weight, else the default weight, else 1.
    pub fn resolve_weight(&self, weight: Option<i32>) -> i32 {
        weight.or(self.weight).unwrap_or(DEFAULT_WEIGHT)
    }

    /// Explicit scheduler, else the default scheduler, else `rr`.
    pub fn resolve_sched<'a>(&'a self, sched: Option<&'a str>) -> &'a str {
        sched
            .filter(|s| !s.is_empty())
            .or_else(|| self.sched_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(DEFAULT_SCHEDULER)
    }

    /// Explicit forward mode, else the default one, else `nat`.
    pub fn resolve_forward(&self, forward: Option<&str>) -> Result<ForwardMode> {
        match forward
            .filter(|s| !s.is_empty())
            .or_else(|| self.forward.as_deref().filter(|s| !s.is_empty()))
        {
            Some(name) => name.parse(),
            None => Ok(ForwardMode::DEFAULT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Defaults {
        Defaults {
            port: Some(8080),
            weight: Some(10),
            sched_name: Some("wlc".into()),
            forward: Some("direct".into()),
        }
    }

    #[test]
    fn test_empty_defaults() {
        let d = Defaults::default();
        assert_eq!(d.resolve_port(0), 0);
        assert_eq!(d.resolve_port(80), 80);
        assert_eq!(d.resolve_weight(None), 1);
        assert_eq!(d.resolve_sched(None), "rr");
        assert_eq!(d.resolve_sched(Some("")), "rr");
        assert_eq!(d.resolve_forward(None).unwrap(), ForwardMode::Nat);
    }

    #[test]
    fn test_explicit_values_win() {
        let d = defaults();
        assert_eq!(d.resolve_port(443), 443);
        assert_eq!(d.resolve_weight(Some(0)), 0);
        assert_eq!(d.resolve_sched(Some("sh")), "sh");
        assert_eq!(d.resolve_forward(Some("tunnel")).unwrap(), ForwardMode::Tunnel);
    }

    #[test]
    fn test_defaults_fill_gaps() {
        let d = defaults();
        assert_eq!(d.resolve_port(0), 8080);
        assert_eq!(d.resolve_weight(None), 10);
        assert_eq!(d.resolve_sched(None), "wlc");
        assert_eq!(d.resolve_forward(None).unwrap(), ForwardMode::Direct);
    }

    #[test]
    fn test_invalid_forward() {
        let d = Defaults::default();
        assert!(d.resolve_forward(Some("bogus")).is_err());
    }
}
