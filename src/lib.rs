//! Payment authorization service.
//!
//! Simulates card authorization against an unreliable bank network, guarded
//! by a circuit breaker, with runtime fault injection, health reporting and
//! Prometheus metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /v1/authorize
//!     ──────────────────▶ http ──▶ payments pipeline ──▶ resilience ──▶ bank
//!                                   │       ▲            (breaker)     (simulator)
//!                                   │       │
//!                                   ▼       └── fault store ◀── POST /admin/fault-inject
//!                             observability
//!                         (counters, histogram) ──▶ GET /health, GET /metrics
//!
//!     Cross-cutting: config, lifecycle (signals, shutdown), logging
//! ```

// Core subsystems
pub mod bank;
pub mod config;
pub mod fault;
pub mod http;
pub mod payments;

// Operator surfaces
pub mod admin;
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
