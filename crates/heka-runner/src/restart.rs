//! Exponential backoff with a bounded restart count per window: backs off up
//! to a max, bounds the restart count within a window, and halts the plugin
//! permanently once that bound is exceeded.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RestartPolicy {
    pub max_restarts: usize,
    pub window: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy {
            max_restarts: 5,
            window: Duration::from_secs(60),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Restart,
    Halt,
}

/// Tracks restart timestamps within the policy's sliding window and computes
/// the backoff for the next attempt.
pub struct RestartTracker {
    policy: RestartPolicy,
    restarts: Vec<Instant>,
    next_backoff: Duration,
}

impl RestartTracker {
    pub fn new(policy: RestartPolicy) -> Self {
        let next_backoff = policy.initial_backoff;
        RestartTracker {
            policy,
            restarts: Vec::new(),
            next_backoff,
        }
    }

    /// Record a failure and decide whether the caller should restart (after
    /// sleeping the returned backoff) or halt permanently.
    pub fn record_failure(&mut self, now: Instant) -> (RestartDecision, Duration) {
        self.restarts.retain(|t| now.duration_since(*t) <= self.policy.window);
        self.restarts.push(now);

        if self.restarts.len() > self.policy.max_restarts {
            return (RestartDecision::Halt, Duration::ZERO);
        }

        let backoff = self.next_backoff;
        self.next_backoff = (self.next_backoff * 2).min(self.policy.max_backoff);
        (RestartDecision::Restart, backoff)
    }

    /// Reset the backoff schedule after a sustained period of healthy running.
    pub fn record_success(&mut self) {
        self.next_backoff = self.policy.initial_backoff;
    }

    /// Restarts currently counted within the policy's window.
    pub fn attempts(&self) -> usize {
        self.restarts.len()
    }
}
