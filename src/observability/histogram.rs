//! Fixed-bucket latency histogram and the bucket quantile reader.
//!
//! The reader is a pure function over `(upper_bound, cumulative_count)` pairs.
//! It returns a bucket boundary, never an interpolated value, so its output is
//! always one of [`LATENCY_BUCKETS_MS`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Bucket upper bounds in milliseconds, ascending.
pub const LATENCY_BUCKETS_MS: [f64; 8] = [
    50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
];

/// One cumulative bucket of a histogram snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

/// Point-in-time copy of a [`LatencyHistogram`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Ascending buckets, the last one with an infinite upper bound.
    pub buckets: Vec<Bucket>,
    pub sample_count: u64,
}

impl HistogramSnapshot {
    pub fn quantile(&self, q: f64) -> f64 {
        bucket_quantile(q, &self.buckets, self.sample_count)
    }
}

/// Concurrent histogram with boundaries fixed at construction.
#[derive(Debug)]
pub struct LatencyHistogram {
    bounds: Vec<f64>,
    // Per-bucket (non-cumulative) counts; the extra slot is +Inf.
    counts: Vec<AtomicU64>,
}

impl LatencyHistogram {
    pub fn new(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            counts: (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Record one sample in milliseconds. A sample equal to a bound falls in
    /// that bound's bucket.
    pub fn observe(&self, value_ms: f64) {
        let idx = self
            .bounds
            .iter()
            .position(|bound| value_ms <= *bound)
            .unwrap_or(self.bounds.len());
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let mut cumulative = 0u64;
        let buckets = self
            .bounds
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .zip(&self.counts)
            .map(|(upper_bound, count)| {
                cumulative += count.load(Ordering::Relaxed);
                Bucket {
                    upper_bound,
                    cumulative_count: cumulative,
                }
            })
            .collect();

        HistogramSnapshot {
            buckets,
            sample_count: cumulative,
        }
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new(&LATENCY_BUCKETS_MS)
    }
}

/// Approximate the `q` quantile from cumulative buckets.
///
/// Returns the upper bound of the first bucket whose cumulative count reaches
/// `q * total`. When that bucket is the infinite one, the previous finite
/// bound is returned instead. Returns 0 for an empty histogram.
pub fn bucket_quantile(q: f64, buckets: &[Bucket], total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let target = q * total as f64;
    let mut prev = 0.0;
    for bucket in buckets {
        if bucket.cumulative_count as f64 >= target {
            if bucket.upper_bound.is_infinite() {
                return prev;
            }
            return bucket.upper_bound;
        }
        prev = bucket.upper_bound;
    }
    prev
}
