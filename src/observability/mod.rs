//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Authorize pipeline / breaker listener:
//!     → metrics.rs (counters, gauges, Prometheus series)
//!     → histogram.rs (in-process latency buckets for /health p95)
//!
//! Everything:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → GET /metrics (Prometheus scrape)
//!     → GET /health (p95 + observed success rate)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments)
//! - The health report never depends on the exporter being installed

pub mod histogram;
pub mod logging;
pub mod metrics;

pub use histogram::{bucket_quantile, Bucket, HistogramSnapshot, LatencyHistogram, LATENCY_BUCKETS_MS};
pub use metrics::AuthMetrics;
