//! Simulated bank network.
//!
//! # Data Flow
//! ```text
//! FaultConfig snapshot
//!     → simulator.rs (effective latency base + success rate)
//!     → random.rs (jitter draw, approval draw)
//!     → sleep, then Approved or DeclinedError
//! ```
//!
//! # Design Decisions
//! - The sleep is the only suspension point and holds no lock
//! - Randomness sits behind a trait so tests can fix the outcome

pub mod random;
pub mod simulator;

pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use simulator::{AuthStatus, BankSimulator, CallProfile, DeclinedError};
