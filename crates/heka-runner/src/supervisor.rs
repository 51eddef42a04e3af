//! Generic restart supervision: `init(config)` → `run(runner, helper)` → loop
//! while inbox open → on exit, optionally persist script state → restart per
//! policy.
//!
//! This wraps any runner's fallible "run once" future in a restart-policy
//! driven retry loop, independent of whether the runner is an `InputRunner`,
//! a `FilterRunner`, or an `OutputRunner`.

use crate::report::TerminalReport;
use crate::restart::{RestartDecision, RestartPolicy, RestartTracker};
use crate::state::{LifecycleState, RunnerState};
use std::future::Future;
use std::time::Instant;
use tracing::{error, warn};

/// Drive `attempt` to completion, restarting it per `policy` whenever it
/// returns `Err`. Returns `Ok(())` if `attempt` ever returns `Ok`, or
/// `Err(report)` once the restart policy is exhausted.
pub async fn supervise<F, Fut>(
    name: &str,
    state: &RunnerState,
    policy: RestartPolicy,
    mut attempt: F,
) -> Result<(), TerminalReport>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut tracker = RestartTracker::new(policy);
    state.set(LifecycleState::Running);

    loop {
        match attempt().await {
            Ok(()) => {
                state.set(LifecycleState::Stopped);
                return Ok(());
            }
            Err(err) => {
                let (decision, backoff) = tracker.record_failure(Instant::now());
                match decision {
                    RestartDecision::Restart => {
                        warn!(runner = name, %err, backoff_ms = backoff.as_millis(), "runner exited, restarting");
                        state.set(LifecycleState::Restarting);
                        tokio::time::sleep(backoff).await;
                        state.set(LifecycleState::Running);
                    }
                    RestartDecision::Halt => {
                        error!(runner = name, %err, "restart policy exhausted, halting permanently");
                        state.set(LifecycleState::Stopped);
                        return Err(TerminalReport {
                            plugin_name: name.to_string(),
                            reason: err.to_string(),
                            restarts_attempted: tracker.attempts(),
                        });
                    }
                }
            }
        }
    }
}
