//! Probabilistic latency sampling: samples processing latency
//! probabilistically (1/N messages) to cap overhead.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct LatencySampler {
    /// Sample roughly one message in every `rate` processed.
    rate: u64,
    calls: AtomicU64,
}

impl LatencySampler {
    pub fn new(rate: u64) -> Self {
        LatencySampler {
            rate: rate.max(1),
            calls: AtomicU64::new(0),
        }
    }

    /// Decide whether the caller should time this call. Uses a counter-based
    /// schedule rather than per-call randomness so the sampling rate is exact
    /// over any window, not just in expectation.
    pub fn should_sample(&self) -> bool {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        n % self.rate == 0
    }

    /// Randomized variant, used where call order across tasks isn't
    /// deterministic enough for the counter schedule to be meaningful.
    pub fn should_sample_random(&self) -> bool {
        rand::thread_rng().gen_range(0..self.rate) == 0
    }
}
