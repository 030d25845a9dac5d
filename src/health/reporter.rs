//! Health snapshot assembly.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::health::state::HealthStatus;
use crate::observability::metrics::AuthMetrics;
use crate::resilience::Breaker;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub latency_p95_ms: f64,
    pub success_rate: f64,
    pub circuit_breaker: String,
    pub version: String,
    pub uptime_seconds: f64,
}

/// Reads breaker state and metrics into a [`HealthReport`].
pub struct HealthReporter {
    version: String,
    started_at: Instant,
    breaker: Arc<dyn Breaker>,
    metrics: Arc<AuthMetrics>,
}

impl HealthReporter {
    pub fn new(version: impl Into<String>, breaker: Arc<dyn Breaker>, metrics: Arc<AuthMetrics>) -> Self {
        Self::with_start(version, Instant::now(), breaker, metrics)
    }

    /// Use an explicit boot timestamp for uptime.
    pub fn with_start(
        version: impl Into<String>,
        started_at: Instant,
        breaker: Arc<dyn Breaker>,
        metrics: Arc<AuthMetrics>,
    ) -> Self {
        Self {
            version: version.into(),
            started_at,
            breaker,
            metrics,
        }
    }

    pub fn report(&self) -> HealthReport {
        let state = self.breaker.state();

        HealthReport {
            status: HealthStatus::from(state),
            latency_p95_ms: self.metrics.latency_p95_ms(),
            success_rate: self.metrics.observed_success_rate(),
            circuit_breaker: state.as_str().to_string(),
            version: self.version.clone(),
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }
}
