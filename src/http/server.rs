//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the shared service parts (breaker, bank, faults, metrics)
//! - Create the Axum router with the public and admin handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until the shutdown signal fires

use axum::{
    routing::{any, get},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::bank::{BankSimulator, RandomSource};
use crate::config::ServiceConfig;
use crate::fault::FaultStore;
use crate::health::HealthReporter;
use crate::http::authorize::authorize;
use crate::http::health::{health, metrics};
use crate::http::request::UuidRequestId;
use crate::lifecycle::shutdown::signalled;
use crate::observability::metrics::AuthMetrics;
use crate::payments::AuthorizationPipeline;
use crate::resilience::{Breaker, BreakerState, CircuitBreaker, StateListener};

/// The long-lived components every request shares.
#[derive(Clone)]
pub struct ServiceParts {
    pub breaker: Arc<dyn Breaker>,
    pub bank: Arc<BankSimulator>,
    pub faults: Arc<FaultStore>,
    pub metrics: Arc<AuthMetrics>,
}

impl ServiceParts {
    /// Build the production wiring: a real circuit breaker whose transitions
    /// feed the metrics.
    pub fn from_config(config: &ServiceConfig, random: Arc<dyn RandomSource>) -> Self {
        let metrics = Arc::new(AuthMetrics::new());

        let listener_metrics = metrics.clone();
        let listener: StateListener = Arc::new(move |name: &str, from: BreakerState, to: BreakerState| {
            listener_metrics.record_breaker_transition(name, from, to);
        });
        let breaker = CircuitBreaker::new(&config.circuit_breaker).with_listener(listener);

        Self {
            breaker: Arc::new(breaker),
            bank: Arc::new(BankSimulator::from_config(&config.service, random)),
            faults: Arc::new(FaultStore::new()),
            metrics,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AuthorizationPipeline>,
    pub health: Arc<HealthReporter>,
    pub faults: Arc<FaultStore>,
    pub config: Arc<ServiceConfig>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        parts: ServiceParts,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        let version = config.service.version.clone();
        let pipeline = AuthorizationPipeline::new(
            version.clone(),
            parts.breaker.clone(),
            parts.bank,
            parts.faults.clone(),
            parts.metrics.clone(),
        );
        let health = HealthReporter::new(version, parts.breaker, parts.metrics);

        Self {
            pipeline: Arc::new(pipeline),
            health: Arc::new(health),
            faults: parts.faults,
            config: Arc::new(config),
            prometheus,
        }
    }
}

/// HTTP server for the authorization service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server with the production wiring for `config`.
    pub fn new(config: ServiceConfig, prometheus: Option<PrometheusHandle>) -> Self {
        let parts = ServiceParts::from_config(&config, Arc::new(crate::bank::ThreadRandom));
        Self::with_state(AppState::new(config, parts, prometheus))
    }

    /// Create a server around pre-built state.
    pub fn with_state(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/authorize", any(authorize))
        .route("/health", any(health))
        .route("/metrics", get(metrics))
        .merge(setup_admin_router(state.clone()))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}
