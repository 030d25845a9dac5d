//! Operator-controlled fault configuration.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Overrides applied to the simulated bank call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    pub enabled: bool,
    pub latency_ms: i64,
    pub success_rate: f64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            latency_ms: 0,
            success_rate: 1.0,
        }
    }
}

/// Shared holder of the active [`FaultConfig`].
///
/// Updates swap in a whole new value, so a reader always gets one consistent
/// triple. No validation happens here: a negative latency or a rate outside
/// `[0, 1]` is stored as-is.
#[derive(Debug)]
pub struct FaultStore {
    current: ArcSwap<FaultConfig>,
}

impl FaultStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(FaultConfig::default()),
        }
    }

    /// Consistent snapshot of the active configuration.
    pub fn get(&self) -> FaultConfig {
        **self.current.load()
    }

    /// Replace all three fields at once.
    pub fn set(&self, enabled: bool, latency_ms: i64, success_rate: f64) -> FaultConfig {
        let config = FaultConfig {
            enabled,
            latency_ms,
            success_rate,
        };
        self.current.store(Arc::new(config));

        tracing::info!(
            enabled,
            latency_ms,
            success_rate,
            "Fault injection updated"
        );
        config
    }
}

impl Default for FaultStore {
    fn default() -> Self {
        Self::new()
    }
}
