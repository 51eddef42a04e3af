//! Per-runner process-message counters: count, failures, duration samples.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const MAX_SAMPLES: usize = 256;

#[derive(Default)]
pub struct RunnerStats {
    processed: AtomicU64,
    failures: AtomicU64,
    durations: Mutex<VecDeque<Duration>>,
}

impl RunnerStats {
    pub fn record_success(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sampled processing duration, evicting the oldest sample once
    /// the ring buffer is full.
    pub fn record_duration(&self, d: Duration) {
        let mut durations = self.durations.lock().expect("stats mutex poisoned");
        if durations.len() == MAX_SAMPLES {
            durations.pop_front();
        }
        durations.push_back(d);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn mean_duration(&self) -> Option<Duration> {
        let durations = self.durations.lock().expect("stats mutex poisoned");
        if durations.is_empty() {
            return None;
        }
        let total: Duration = durations.iter().sum();
        Some(total / durations.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_counts_and_mean_duration() {
        let stats = RunnerStats::default();
        stats.record_success();
        stats.record_success();
        stats.record_failure();
        stats.record_duration(Duration::from_millis(10));
        stats.record_duration(Duration::from_millis(20));

        assert_eq!(stats.processed(), 2);
        assert_eq!(stats.failures(), 1);
        assert_eq!(stats.mean_duration(), Some(Duration::from_millis(15)));
    }

    #[test]
    fn duration_ring_buffer_evicts_oldest() {
        let stats = RunnerStats::default();
        for i in 0..300 {
            stats.record_duration(Duration::from_millis(i));
        }
        let durations = stats.durations.lock().unwrap();
        assert_eq!(durations.len(), MAX_SAMPLES);
        assert_eq!(durations.front(), Some(&Duration::from_millis(44)));
    }
}
