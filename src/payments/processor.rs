//! Authorization request pipeline.

use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use crate::bank::{AuthStatus, BankSimulator};
use crate::fault::FaultStore;
use crate::observability::metrics::AuthMetrics;
use crate::payments::types::{new_transaction_id, AuthorizeRequest, AuthorizeResponse};
use crate::resilience::{Breaker, BreakerError, BreakerState};

/// Reasons an authorization is refused instead of answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizeError {
    #[error("circuit breaker open")]
    BreakerOpen,
}

/// Runs one authorization: fault snapshot, guarded bank call, bookkeeping.
pub struct AuthorizationPipeline {
    version: String,
    breaker: Arc<dyn Breaker>,
    bank: Arc<BankSimulator>,
    faults: Arc<FaultStore>,
    metrics: Arc<AuthMetrics>,
}

impl AuthorizationPipeline {
    pub fn new(
        version: impl Into<String>,
        breaker: Arc<dyn Breaker>,
        bank: Arc<BankSimulator>,
        faults: Arc<FaultStore>,
        metrics: Arc<AuthMetrics>,
    ) -> Self {
        Self {
            version: version.into(),
            breaker,
            bank,
            faults,
            metrics,
        }
    }

    /// Authorize a request.
    ///
    /// A bank decline is a normal outcome and comes back as `Ok` with a
    /// declined status, as does a half-open call turned away for lack of
    /// probe slots. Only an open breaker is an error, whether it refused the
    /// call up front or is open once the call fails; those requests are not
    /// counted.
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
    ) -> Result<AuthorizeResponse, AuthorizeError> {
        let transaction_id = new_transaction_id();
        let fault = self.faults.get();

        let start = Instant::now();
        let result = self
            .breaker
            .execute(Box::pin(self.bank.authorize(fault)))
            .await;
        let elapsed = start.elapsed();

        let status = match result {
            Ok(status) => status,
            Err(BreakerError::Open) => {
                tracing::warn!(transaction_id = %transaction_id, "Rejected: circuit breaker open");
                return Err(AuthorizeError::BreakerOpen);
            }
            // An open breaker wins over the call's own failure, including the
            // failure that tripped it.
            Err(_) if self.breaker.state() == BreakerState::Open => {
                tracing::warn!(transaction_id = %transaction_id, "Rejected: circuit breaker opened during call");
                return Err(AuthorizeError::BreakerOpen);
            }
            Err(BreakerError::TooManyRequests) => {
                tracing::debug!(transaction_id = %transaction_id, "Half-open probe limit reached");
                AuthStatus::Declined
            }
            Err(BreakerError::Call(err)) => {
                tracing::debug!(transaction_id = %transaction_id, error = %err, "Bank call failed");
                AuthStatus::Declined
            }
        };

        let processor = request.processor_label().to_string();
        self.metrics
            .record_outcome(&self.version, status, &processor, elapsed);

        let latency_ms = elapsed.as_millis() as u64;
        tracing::info!(
            transaction_id = %transaction_id,
            status = %status,
            processor = %processor,
            latency_ms,
            "Authorization completed"
        );

        Ok(AuthorizeResponse {
            transaction_id,
            status,
            processor,
            amount: request.amount,
            latency_ms,
            version: self.version.clone(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::FixedRandom;
    use crate::config::CircuitBreakerConfig;
    use crate::resilience::{CircuitBreaker, ManualBreaker};
    use std::time::Duration;

    struct Harness {
        pipeline: AuthorizationPipeline,
        bank: Arc<BankSimulator>,
        faults: Arc<FaultStore>,
        metrics: Arc<AuthMetrics>,
    }

    fn harness(breaker: Arc<dyn Breaker>, success_rate: f64, unit: f64) -> Harness {
        let bank = Arc::new(BankSimulator::new(
            200,
            success_rate,
            Arc::new(FixedRandom { jitter_ms: 0, unit }),
        ));
        let faults = Arc::new(FaultStore::new());
        let metrics = Arc::new(AuthMetrics::new());
        let pipeline = AuthorizationPipeline::new(
            "1.2.3",
            breaker,
            bank.clone(),
            faults.clone(),
            metrics.clone(),
        );
        Harness {
            pipeline,
            bank,
            faults,
            metrics,
        }
    }

    fn real_breaker(metrics_sink: Option<Arc<AuthMetrics>>) -> Arc<CircuitBreaker> {
        let breaker = CircuitBreaker::new(&CircuitBreakerConfig::default());
        Arc::new(match metrics_sink {
            Some(m) => breaker.with_listener(Arc::new(move |name: &str, from: BreakerState, to: BreakerState| {
                m.record_breaker_transition(name, from, to)
            })),
            None => breaker,
        })
    }

    fn visa(amount: f64) -> AuthorizeRequest {
        AuthorizeRequest {
            amount,
            processor: "visa".into(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn approves_everything_at_full_success_rate() {
        let h = harness(real_breaker(None), 1.0, 0.99);
        for _ in 0..20 {
            let resp = h.pipeline.authorize(visa(10.5)).await.unwrap();
            assert_eq!(resp.status, AuthStatus::Approved);
            assert_eq!(resp.processor, "visa");
            assert_eq!(resp.amount, 10.5);
            assert_eq!(resp.version, "1.2.3");
            assert_eq!(resp.latency_ms, 200);
        }
        assert_eq!(h.metrics.observed_success_rate(), 1.0);
        assert_eq!(h.metrics.counters(), (20, 20));
    }

    #[tokio::test(start_paused = true)]
    async fn declines_trip_the_breaker_then_fail_fast() {
        let h = harness(real_breaker(None), 0.0, 0.0);

        for _ in 0..4 {
            let resp = h.pipeline.authorize(AuthorizeRequest::default()).await.unwrap();
            assert_eq!(resp.status, AuthStatus::Declined);
            assert_eq!(resp.processor, "unknown");
        }
        assert_eq!(h.metrics.observed_success_rate(), 0.0);

        // The fifth decline trips the breaker and is answered as open.
        let err = h.pipeline.authorize(visa(1.0)).await.unwrap_err();
        assert_eq!(err, AuthorizeError::BreakerOpen);
        assert_eq!(h.bank.calls(), 5);

        for _ in 0..3 {
            let err = h.pipeline.authorize(visa(1.0)).await.unwrap_err();
            assert_eq!(err, AuthorizeError::BreakerOpen);
            assert_eq!(err.to_string(), "circuit breaker open");
        }
        assert_eq!(h.bank.calls(), 5);
        assert_eq!(h.metrics.counters(), (4, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_through_half_open() {
        let metrics_sink = Arc::new(AuthMetrics::new());
        let breaker = real_breaker(Some(metrics_sink.clone()));
        let h = harness(breaker.clone(), 0.0, 0.5);

        for _ in 0..5 {
            let _ = h.pipeline.authorize(visa(1.0)).await;
        }
        assert_eq!(breaker.current_state(), BreakerState::Open);
        assert_eq!(metrics_sink.breaker_trips(), 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        h.faults.set(true, 0, 1.0);

        for _ in 0..3 {
            let resp = h.pipeline.authorize(visa(1.0)).await.unwrap();
            assert_eq!(resp.status, AuthStatus::Approved);
        }
        assert_eq!(breaker.current_state(), BreakerState::Closed);
        assert_eq!(h.bank.calls(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens() {
        let breaker = real_breaker(None);
        let h = harness(breaker.clone(), 0.0, 0.5);
        for _ in 0..5 {
            let _ = h.pipeline.authorize(visa(1.0)).await;
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(breaker.current_state(), BreakerState::HalfOpen);

        // The failed probe reopens the breaker, so it is answered as open.
        assert_eq!(
            h.pipeline.authorize(visa(1.0)).await.unwrap_err(),
            AuthorizeError::BreakerOpen
        );
        assert_eq!(breaker.current_state(), BreakerState::Open);
        assert_eq!(h.bank.calls(), 6);
        assert_eq!(
            h.pipeline.authorize(visa(1.0)).await.unwrap_err(),
            AuthorizeError::BreakerOpen
        );
        assert_eq!(h.bank.calls(), 6);
        assert_eq!(h.metrics.counters(), (4, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn fault_with_zero_latency_uses_default_base() {
        let h = harness(real_breaker(None), 1.0, 0.5);
        h.faults.set(true, 0, 0.0);

        let resp = h.pipeline.authorize(visa(5.0)).await.unwrap();
        assert_eq!(resp.status, AuthStatus::Declined);
        assert_eq!(resp.latency_ms, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn fault_latency_override_applies() {
        let h = harness(real_breaker(None), 1.0, 0.5);
        h.faults.set(true, 750, 1.0);

        let resp = h.pipeline.authorize(visa(5.0)).await.unwrap();
        assert_eq!(resp.status, AuthStatus::Approved);
        assert_eq!(resp.latency_ms, 750);
    }

    #[tokio::test]
    async fn open_breaker_never_reaches_bank() {
        let breaker = Arc::new(ManualBreaker::new(BreakerState::Open));
        let h = harness(breaker.clone(), 1.0, 0.0);

        assert_eq!(
            h.pipeline.authorize(visa(1.0)).await.unwrap_err(),
            AuthorizeError::BreakerOpen
        );
        assert_eq!(h.bank.calls(), 0);
        assert_eq!(breaker.admitted(), 0);
        assert_eq!(h.metrics.counters(), (0, 0));
    }

    #[tokio::test]
    async fn exhausted_half_open_quota_is_a_counted_decline() {
        let breaker = Arc::new(ManualBreaker::new(BreakerState::HalfOpen));
        let h = harness(breaker.clone(), 1.0, 0.0);

        let resp = h.pipeline.authorize(visa(1.0)).await.unwrap();
        assert_eq!(resp.status, AuthStatus::Declined);
        assert_eq!(resp.processor, "visa");

        assert_eq!(h.bank.calls(), 0);
        assert_eq!(breaker.admitted(), 0);
        assert_eq!(h.metrics.counters(), (1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn decline_after_concurrent_trip_is_rejected() {
        let breaker = Arc::new(ManualBreaker::new(BreakerState::Closed));
        let h = Arc::new(harness(breaker.clone(), 0.0, 0.5));

        let in_flight = {
            let h = h.clone();
            tokio::spawn(async move { h.pipeline.authorize(visa(1.0)).await })
        };
        // Let the call reach the bank sleep, then trip the breaker under it.
        tokio::task::yield_now().await;
        assert_eq!(h.bank.calls(), 1);
        breaker.set_state(BreakerState::Open);

        assert_eq!(in_flight.await.unwrap().unwrap_err(), AuthorizeError::BreakerOpen);
        assert_eq!(h.metrics.counters(), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn approval_stands_even_if_breaker_opened_meanwhile() {
        let breaker = Arc::new(ManualBreaker::new(BreakerState::Closed));
        let h = Arc::new(harness(breaker.clone(), 1.0, 0.5));

        let in_flight = {
            let h = h.clone();
            tokio::spawn(async move { h.pipeline.authorize(visa(1.0)).await })
        };
        tokio::task::yield_now().await;
        breaker.set_state(BreakerState::Open);

        let resp = in_flight.await.unwrap().unwrap();
        assert_eq!(resp.status, AuthStatus::Approved);
        assert_eq!(h.metrics.counters(), (1, 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_keep_counters_consistent() {
        let bank = Arc::new(BankSimulator::new(
            0,
            0.5,
            Arc::new(crate::bank::SeededRandom::new(42)),
        ));
        let metrics = Arc::new(AuthMetrics::new());
        let pipeline = Arc::new(AuthorizationPipeline::new(
            "1.2.3",
            Arc::new(ManualBreaker::new(BreakerState::Closed)),
            bank,
            Arc::new(FaultStore::new()),
            metrics.clone(),
        ));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let pipeline = pipeline.clone();
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        pipeline.authorize(visa(1.0)).await.unwrap();
                        let (total, approved) = metrics.counters();
                        assert!(approved <= total);
                    }
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        let (total, approved) = metrics.counters();
        assert_eq!(total, 400);
        assert!(approved <= total);
    }
}
