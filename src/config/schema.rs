//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the authorization service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Simulated bank behaviour and reported version.
    pub service: AuthServiceConfig,

    /// Circuit breaker guarding the bank call.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoint settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Behaviour of the simulated bank network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthServiceConfig {
    /// Version string reported in responses, labels and health output.
    pub version: String,

    /// Base latency of a bank call in milliseconds (before jitter).
    pub latency_base_ms: i64,

    /// Probability that a bank call approves, when no fault is injected.
    pub success_rate: f64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            latency_base_ms: 200,
            success_rate: 0.94,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Name used in logs.
    pub name: String,

    /// Probes admitted while half-open, and consecutive successes needed to close.
    pub max_requests: u32,

    /// Rolling window in seconds after which closed-state counts reset (0 = never).
    pub interval_secs: u64,

    /// Cooldown in seconds spent open before probing.
    pub timeout_secs: u64,

    /// Consecutive failures that trip the breaker.
    pub failure_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "bank-api".to_string(),
            max_requests: 3,
            interval_secs: 60,
            timeout_secs: 30,
            failure_threshold: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus exporter and serve `/metrics`.
    pub metrics_enabled: bool,

    /// Seconds between exporter upkeep runs.
    pub upkeep_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            upkeep_interval_secs: 5,
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on `/admin/*`. Unset leaves the endpoints open.
    pub api_key: Option<String>,
}
