//! Shared utilities for integration tests.

#![allow(dead_code)]

use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use paystream_auth::bank::FixedRandom;
use paystream_auth::config::ServiceConfig;
use paystream_auth::http::{AppState, HttpServer, ServiceParts};
use paystream_auth::lifecycle::Shutdown;

/// A service running on an ephemeral local port.
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config with no simulated latency and a fixed bank success rate.
pub fn test_config(success_rate: f64) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.service.latency_base_ms = 0;
    config.service.success_rate = success_rate;
    config
}

/// Boot the service with a deterministic random source: zero jitter and an
/// approval draw of 0.5, so any success rate above 0.5 approves and any at or
/// below declines.
pub async fn start_service(config: ServiceConfig) -> TestService {
    start_service_with(config, None).await
}

/// Like [`start_service`], serving `/metrics` from `prometheus`.
pub async fn start_service_with(
    config: ServiceConfig,
    prometheus: Option<PrometheusHandle>,
) -> TestService {
    let random = Arc::new(FixedRandom {
        jitter_ms: 0,
        unit: 0.5,
    });
    let parts = ServiceParts::from_config(&config, random);
    let server = HttpServer::with_state(AppState::new(config, parts, prometheus));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestService {
        addr,
        shutdown,
        client: reqwest::Client::new(),
    }
}
