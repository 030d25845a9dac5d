//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Authorize request
//!     → circuit_breaker.rs (admit, or fail fast while open)
//!     → bank simulator (guarded call)
//!     → circuit_breaker.rs (record outcome, maybe transition)
//!     → state listener (gauge + trip counter)
//! ```
//!
//! # Design Decisions
//! - The breaker is the only resilience mechanism; nothing is retried
//! - A breaker rejection is distinct from a bank decline
//! - Pipeline depends on the `Breaker` trait so tests can substitute a double

pub mod circuit_breaker;

pub use circuit_breaker::{
    Breaker, BreakerError, BreakerState, CallFuture, CircuitBreaker, Counts, ManualBreaker,
    StateListener,
};
