//! Service health derived from the breaker state.
//!
//! ```text
//! closed    → healthy   (200)
//! half-open → degraded  (200)
//! open      → unhealthy (503)
//! ```

use serde::{Deserialize, Serialize};

use crate::resilience::BreakerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_unhealthy(&self) -> bool {
        *self == HealthStatus::Unhealthy
    }
}

impl From<BreakerState> for HealthStatus {
    fn from(state: BreakerState) -> Self {
        match state {
            BreakerState::Closed => HealthStatus::Healthy,
            BreakerState::HalfOpen => HealthStatus::Degraded,
            BreakerState::Open => HealthStatus::Unhealthy,
        }
    }
}
