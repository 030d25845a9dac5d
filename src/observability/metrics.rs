//! Metrics collection and exposition.
//!
//! # Metrics
//! - `auth_request_duration_seconds` (histogram): latency by version, status, processor
//! - `auth_requests_total` (counter): requests by version, status, processor
//! - `auth_success_rate` (gauge): observed approval ratio (0-1)
//! - `circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `circuit_breaker_trips_total` (counter): transitions into open
//!
//! # Design Decisions
//! - Exported series go through the `metrics` facade; recording never fails
//! - Approval counters and the latency histogram are also kept locally so the
//!   health report does not depend on the exporter being installed

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::bank::AuthStatus;
use crate::observability::histogram::{HistogramSnapshot, LatencyHistogram, LATENCY_BUCKETS_MS};
use crate::resilience::circuit_breaker::BreakerState;

pub const REQUEST_DURATION: &str = "auth_request_duration_seconds";
pub const REQUESTS_TOTAL: &str = "auth_requests_total";
pub const SUCCESS_RATE: &str = "auth_success_rate";
pub const BREAKER_STATE: &str = "circuit_breaker_state";
pub const BREAKER_TRIPS: &str = "circuit_breaker_trips_total";

/// Build the Prometheus recorder with the duration buckets (in seconds).
pub fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    let buckets: Vec<f64> = LATENCY_BUCKETS_MS.iter().map(|ms| ms / 1000.0).collect();
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &buckets)
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_exporter() -> Result<PrometheusHandle, BuildError> {
    let handle = prometheus_builder()?.install_recorder()?;
    describe_metrics();
    seed_metrics();
    Ok(handle)
}

/// Publish the unlabeled series at their startup values so they are
/// scrapeable before the first request or transition.
pub fn seed_metrics() {
    gauge!(SUCCESS_RATE).set(1.0);
    gauge!(BREAKER_STATE).set(BreakerState::Closed.gauge_value());
    counter!(BREAKER_TRIPS).absolute(0);
}

/// Register HELP text for every exported series.
pub fn describe_metrics() {
    describe_histogram!(
        REQUEST_DURATION,
        Unit::Seconds,
        "Duration of authorization requests in seconds."
    );
    describe_counter!(REQUESTS_TOTAL, "Total number of authorization requests.");
    describe_gauge!(SUCCESS_RATE, "Current authorization success rate (0-1).");
    describe_gauge!(
        BREAKER_STATE,
        "Current circuit breaker state: 0=closed, 1=half-open, 2=open."
    );
    describe_counter!(BREAKER_TRIPS, "Total number of circuit breaker trips.");
}

/// Run exporter maintenance until `shutdown` fires.
pub async fn run_upkeep(
    handle: PrometheusHandle,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => handle.run_upkeep(),
            _ = shutdown.recv() => {
                tracing::debug!("Metrics upkeep stopping");
                break;
            }
        }
    }
}

/// Request counters, latency histogram and breaker bookkeeping.
#[derive(Debug)]
pub struct AuthMetrics {
    total_requests: AtomicU64,
    approved_requests: AtomicU64,
    breaker_trips: AtomicU64,
    latency: LatencyHistogram,
}

impl AuthMetrics {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            approved_requests: AtomicU64::new(0),
            breaker_trips: AtomicU64::new(0),
            latency: LatencyHistogram::default(),
        }
    }

    /// Record one completed authorization.
    pub fn record_outcome(
        &self,
        version: &str,
        status: AuthStatus,
        processor: &str,
        elapsed: Duration,
    ) {
        // total before approved keeps approved <= total for any reader that
        // loads approved first.
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        if status == AuthStatus::Approved {
            self.approved_requests.fetch_add(1, Ordering::SeqCst);
        }

        gauge!(SUCCESS_RATE).set(self.observed_success_rate());

        self.latency.observe(elapsed.as_secs_f64() * 1000.0);

        let labels = [
            ("version", version.to_string()),
            ("status", status.as_str().to_string()),
            ("processor", processor.to_string()),
        ];
        histogram!(REQUEST_DURATION, &labels).record(elapsed.as_secs_f64());
        counter!(REQUESTS_TOTAL, &labels).increment(1);
    }

    /// Breaker state change hook: gauge always, trip counter on entering open.
    pub fn record_breaker_transition(&self, name: &str, from: BreakerState, to: BreakerState) {
        tracing::warn!(breaker = %name, from = %from, to = %to, "Circuit breaker state changed");

        gauge!(BREAKER_STATE).set(to.gauge_value());
        if to == BreakerState::Open {
            self.breaker_trips.fetch_add(1, Ordering::Relaxed);
            counter!(BREAKER_TRIPS).increment(1);
        }
    }

    /// `(total, approved)`, read so that approved never exceeds total.
    pub fn counters(&self) -> (u64, u64) {
        let approved = self.approved_requests.load(Ordering::SeqCst);
        let total = self.total_requests.load(Ordering::SeqCst);
        (total, approved)
    }

    /// Approved over total, or 1.0 before any request has completed.
    pub fn observed_success_rate(&self) -> f64 {
        let (total, approved) = self.counters();
        if total == 0 {
            return 1.0;
        }
        approved as f64 / total as f64
    }

    pub fn breaker_trips(&self) -> u64 {
        self.breaker_trips.load(Ordering::Relaxed)
    }

    pub fn latency_snapshot(&self) -> HistogramSnapshot {
        self.latency.snapshot()
    }

    /// Bucket-resolution p95 latency in milliseconds (0 when empty).
    pub fn latency_p95_ms(&self) -> f64 {
        self.latency_snapshot().quantile(0.95)
    }
}

impl Default for AuthMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_defaults_to_one() {
        let metrics = AuthMetrics::new();
        assert_eq!(metrics.observed_success_rate(), 1.0);
        assert_eq!(metrics.latency_p95_ms(), 0.0);
    }

    #[test]
    fn counts_approved_and_declined() {
        let metrics = AuthMetrics::new();
        for _ in 0..3 {
            metrics.record_outcome("1.0.0", AuthStatus::Approved, "visa", Duration::from_millis(40));
        }
        metrics.record_outcome("1.0.0", AuthStatus::Declined, "unknown", Duration::from_millis(90));

        assert_eq!(metrics.counters(), (4, 3));
        assert_eq!(metrics.observed_success_rate(), 0.75);
        assert_eq!(metrics.latency_p95_ms(), 100.0);
    }

    #[test]
    fn only_open_transitions_count_as_trips() {
        let metrics = AuthMetrics::new();
        metrics.record_breaker_transition("bank-api", BreakerState::Closed, BreakerState::Open);
        metrics.record_breaker_transition("bank-api", BreakerState::Open, BreakerState::HalfOpen);
        metrics.record_breaker_transition("bank-api", BreakerState::HalfOpen, BreakerState::Open);
        metrics.record_breaker_transition("bank-api", BreakerState::Open, BreakerState::HalfOpen);
        metrics.record_breaker_transition("bank-api", BreakerState::HalfOpen, BreakerState::Closed);

        assert_eq!(metrics.breaker_trips(), 2);
    }

    #[test]
    fn concurrent_updates_keep_approved_below_total() {
        let metrics = std::sync::Arc::new(AuthMetrics::new());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for n in 0..500 {
                        let status = if (i + n) % 3 == 0 {
                            AuthStatus::Declined
                        } else {
                            AuthStatus::Approved
                        };
                        metrics.record_outcome("t", status, "visa", Duration::from_millis(1));
                        let (total, approved) = metrics.counters();
                        assert!(approved <= total);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let (total, approved) = metrics.counters();
        assert_eq!(total, 4000);
        assert!(approved <= total);
    }

    #[test]
    fn seeded_series_render_before_any_event() {
        let recorder = prometheus_builder().unwrap().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_metrics();
            seed_metrics();
        });

        let text = handle.render();
        assert!(text.contains("auth_success_rate 1"));
        assert!(text.contains("circuit_breaker_state 0"));
        assert!(text.contains("circuit_breaker_trips_total 0"));
    }

    #[test]
    fn exporter_renders_recorded_series() {
        let recorder = prometheus_builder().unwrap().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let metrics = AuthMetrics::new();
            metrics.record_outcome("9.9.9", AuthStatus::Approved, "visa", Duration::from_millis(70));
            metrics.record_breaker_transition("bank-api", BreakerState::Closed, BreakerState::Open);
        });

        let text = handle.render();
        assert!(text.contains("auth_requests_total"));
        assert!(text.contains("version=\"9.9.9\""));
        assert!(text.contains("processor=\"visa\""));
        assert!(text.contains("auth_request_duration_seconds_bucket"));
        assert!(text.contains("le=\"0.1\""));
        assert!(text.contains("circuit_breaker_trips_total 1"));
        assert!(text.contains("circuit_breaker_state 2"));
    }
}
