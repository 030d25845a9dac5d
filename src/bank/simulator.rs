//! Simulated bank authorization call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::bank::random::RandomSource;
use crate::config::AuthServiceConfig;
use crate::fault::FaultConfig;

/// Final status of an authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Approved,
    Declined,
}

impl AuthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::Approved => "approved",
            AuthStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bank refused the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bank declined transaction")]
pub struct DeclinedError;

/// Latency and approval odds used for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallProfile {
    pub latency_base_ms: i64,
    pub success_rate: f64,
}

/// Stand-in for the card network: sleeps, then approves with some probability.
pub struct BankSimulator {
    latency_base_ms: i64,
    success_rate: f64,
    random: Arc<dyn RandomSource>,
    calls: AtomicU64,
}

impl BankSimulator {
    pub fn new(latency_base_ms: i64, success_rate: f64, random: Arc<dyn RandomSource>) -> Self {
        Self {
            latency_base_ms,
            success_rate,
            random,
            calls: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &AuthServiceConfig, random: Arc<dyn RandomSource>) -> Self {
        Self::new(config.latency_base_ms, config.success_rate, random)
    }

    /// Resolve the profile for a call given the active fault snapshot.
    ///
    /// The latency override only applies when it is positive; the rate
    /// override applies whenever faults are enabled.
    pub fn profile(&self, fault: &FaultConfig) -> CallProfile {
        let latency_base_ms = if fault.enabled && fault.latency_ms > 0 {
            fault.latency_ms
        } else {
            self.latency_base_ms
        };
        let success_rate = if fault.enabled {
            fault.success_rate
        } else {
            self.success_rate
        };

        CallProfile {
            latency_base_ms,
            success_rate,
        }
    }

    /// Perform one simulated authorization.
    pub async fn authorize(&self, fault: FaultConfig) -> Result<AuthStatus, DeclinedError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let profile = self.profile(&fault);

        let sleep_ms = (profile.latency_base_ms + self.random.jitter_ms()).max(0);
        tokio::time::sleep(Duration::from_millis(sleep_ms as u64)).await;

        if self.random.unit() < profile.success_rate {
            Ok(AuthStatus::Approved)
        } else {
            Err(DeclinedError)
        }
    }

    /// Number of times [`authorize`](Self::authorize) has been entered.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for BankSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankSimulator")
            .field("latency_base_ms", &self.latency_base_ms)
            .field("success_rate", &self.success_rate)
            .field("calls", &self.calls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::random::FixedRandom;
    use tokio::time::Instant;

    fn bank(base: i64, rate: f64, jitter_ms: i64, unit: f64) -> BankSimulator {
        BankSimulator::new(base, rate, Arc::new(FixedRandom { jitter_ms, unit }))
    }

    fn fault(enabled: bool, latency_ms: i64, success_rate: f64) -> FaultConfig {
        FaultConfig {
            enabled,
            latency_ms,
            success_rate,
        }
    }

    #[test]
    fn profile_uses_defaults_when_disabled() {
        let b = bank(200, 0.94, 0, 0.0);
        let p = b.profile(&fault(false, 900, 0.0));
        assert_eq!(p, CallProfile { latency_base_ms: 200, success_rate: 0.94 });
    }

    #[test]
    fn zero_latency_override_falls_back_to_default() {
        let b = bank(200, 0.94, 0, 0.0);
        let p = b.profile(&fault(true, 0, 0.0));
        assert_eq!(p, CallProfile { latency_base_ms: 200, success_rate: 0.0 });

        let p = b.profile(&fault(true, 750, 0.3));
        assert_eq!(p, CallProfile { latency_base_ms: 750, success_rate: 0.3 });
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_base_plus_jitter() {
        let b = bank(100, 1.0, 30, 0.5);
        let start = Instant::now();
        assert_eq!(b.authorize(FaultConfig::default()).await, Ok(AuthStatus::Approved));
        assert_eq!(start.elapsed(), Duration::from_millis(130));
    }

    #[tokio::test(start_paused = true)]
    async fn negative_latency_clamps_to_zero() {
        let b = bank(10, 1.0, -50, 0.5);
        let start = Instant::now();
        b.authorize(FaultConfig::default()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn draw_must_be_strictly_below_rate() {
        let b = bank(0, 0.5, 0, 0.5);
        assert_eq!(b.authorize(FaultConfig::default()).await, Err(DeclinedError));

        let b = bank(0, 0.5, 0, 0.4999);
        assert_eq!(b.authorize(FaultConfig::default()).await, Ok(AuthStatus::Approved));
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_above_one_always_approves() {
        let b = bank(0, 0.0, 0, 0.99);
        let out = b.authorize(fault(true, 0, 1.5)).await;
        assert_eq!(out, Ok(AuthStatus::Approved));
    }
}
