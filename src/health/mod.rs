//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → reporter.rs (breaker state, observed success rate, p95, uptime)
//!     → state.rs (healthy / degraded / unhealthy)
//! ```
//!
//! # Design Decisions
//! - Reads are independent of request handling; the state may already have
//!   changed by the time the report is sent
//! - p95 comes from histogram buckets and is a bucket boundary, not an
//!   interpolated percentile

pub mod reporter;
pub mod state;

pub use reporter::{HealthReport, HealthReporter};
pub use state::HealthStatus;
