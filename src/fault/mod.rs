//! Fault injection subsystem.
//!
//! # Data Flow
//! ```text
//! POST /admin/fault-inject
//!     → store.rs (replace whole FaultConfig)
//!
//! Every authorize request
//!     → store.rs (one snapshot per request)
//!     → bank simulator (effective latency / success rate)
//! ```
//!
//! # Design Decisions
//! - Copy-on-write snapshot: readers never see a half-applied update
//! - Operators are trusted; values are stored exactly as given

pub mod store;

pub use store::{FaultConfig, FaultStore};
