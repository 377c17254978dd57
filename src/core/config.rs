//! # Engine configuration.
//!
//! [`EngineConfig`] holds the runtime knobs of one engine. The closed
//! [`TagSet`](crate::TagSet) and the [`StopMode`](crate::StopMode) are passed to the
//! builder separately since they define behavior rather than tuning.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `grace = 0s` → shutdown aborts the worker unless it is already idle

use std::time::Duration;

/// Runtime configuration for one engine.
///
/// ## Field semantics
/// - `name`: engine name, used in events and as the worker's tracing span field
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long [`Engine::shutdown`](crate::Engine::shutdown) waits for the
///   current handler to return before aborting the worker
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Engine name (debugging, logs, events).
    pub name: String,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Subscribers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// Maximum time to wait for a graceful worker exit on shutdown.
    pub grace: Duration,
}

impl EngineConfig {
    /// Default configuration with the given engine name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for EngineConfig {
    /// - `name = "flexqueue"`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            name: "flexqueue".to_string(),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keeps_defaults() {
        let cfg = EngineConfig::named("mailer");
        assert_eq!(cfg.name, "mailer");
        assert_eq!(cfg.bus_capacity, 1024);
        assert_eq!(cfg.grace, Duration::from_secs(30));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = EngineConfig {
            bus_capacity: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
