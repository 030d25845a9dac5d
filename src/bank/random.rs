//! Randomness used by the bank simulator.
//!
//! Production draws from the thread-local RNG; tests plug in a seeded or
//! fixed source to make outcomes reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Maximum absolute jitter added to the base latency.
pub const JITTER_MS: i64 = 50;

/// Source of the two random draws made per bank call.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[-JITTER_MS, JITTER_MS]`.
    fn jitter_ms(&self) -> i64;

    /// Uniform float in `[0, 1)`.
    fn unit(&self) -> f64;
}

/// Unseeded thread-local randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn jitter_ms(&self) -> i64 {
        rand::thread_rng().gen_range(-JITTER_MS..=JITTER_MS)
    }

    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic randomness from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn jitter_ms(&self) -> i64 {
        self.with_rng(|rng| rng.gen_range(-JITTER_MS..=JITTER_MS))
    }

    fn unit(&self) -> f64 {
        self.with_rng(|rng| rng.gen::<f64>())
    }
}

/// Always returns the same draws.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    pub jitter_ms: i64,
    pub unit: f64,
}

impl RandomSource for FixedRandom {
    fn jitter_ms(&self) -> i64 {
        self.jitter_ms
    }

    fn unit(&self) -> f64 {
        self.unit
    }
}
