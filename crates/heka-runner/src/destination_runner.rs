//! `FilterRunner` / `OutputRunner`: owns a destination's inbox
//! and periodic ticker, tracks process-message counters, and — for filters —
//! lets the plugin inject new packs back into the router from a dedicated
//! inject pool, kept separate from the input pool so a saturated filter can
//! never deadlock the pipeline it feeds.

use crate::stats::RunnerStats;
use crate::state::{LifecycleState, RunnerState};
use heka_core::pack::{DeliveryResult, PackPool, PackRef};
use heka_router::Router;
use heka_sandbox::{ProcessOutcome, ScriptPlugin};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Handle a filter plugin uses to push a newly-constructed pack back through
/// the router, independent of the destination's own inbox.
pub struct InjectHandle {
    pool: PackPool,
    router: Arc<Router>,
}

impl InjectHandle {
    pub fn new(pool: PackPool, router: Arc<Router>) -> Self {
        InjectHandle { pool, router }
    }

    /// Acquire a pack from the inject pool without blocking — a full inject
    /// pool means the injected message is dropped, never backpressures the
    /// caller — a dedicated inject pool exists to prevent deadlock.
    pub fn try_acquire(&self) -> Option<heka_core::pack::OwnedPack> {
        self.pool.try_acquire()
    }

    pub async fn inject(&self, pack: heka_core::pack::OwnedPack) -> anyhow::Result<()> {
        self.router.route(pack).await?;
        Ok(())
    }
}

/// Drives one destination plugin: pulls packs off its inbox, calls
/// `process_message`, fires `timer_event` on a fixed tick, and tracks the
/// counters an admin report reads.
pub struct DestinationRunner {
    name: String,
    pub state: RunnerState,
    pub stats: RunnerStats,
    tick_interval: Duration,
    sample_every: u64,
}

impl DestinationRunner {
    pub fn new(name: impl Into<String>, tick_interval: Duration) -> Self {
        DestinationRunner {
            name: name.into(),
            state: RunnerState::default(),
            stats: RunnerStats::default(),
            tick_interval,
            sample_every: 100,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the destination loop until the inbox closes or the plugin returns
    /// a fatal outcome. `_inject` is `Some` only for filters — held here so
    /// the injected-pack path shares this runner's lifetime, even though the
    /// host contract calls back into it outside the `ScriptPlugin` trait
    /// itself.
    pub async fn run<P: ScriptPlugin>(
        &self,
        plugin: &mut P,
        mut inbox: mpsc::Receiver<PackRef>,
        _inject: Option<&InjectHandle>,
    ) -> anyhow::Result<()> {
        self.state.set(LifecycleState::Running);
        let sampler = heka_sandbox::LatencySampler::new(self.sample_every);
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                maybe_pack = inbox.recv() => {
                    let Some(pack) = maybe_pack else {
                        return Ok(());
                    };
                    self.process_one(plugin, pack, &sampler).await?;
                }
                _ = ticker.tick() => {
                    let outcome = plugin.timer_event(0).await;
                    if self.handle_outcome(plugin, outcome)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn process_one<P: ScriptPlugin>(
        &self,
        plugin: &mut P,
        pack: PackRef,
        sampler: &heka_sandbox::LatencySampler,
    ) -> anyhow::Result<()> {
        let sample = sampler.should_sample();
        let start = sample.then(std::time::Instant::now);

        let outcome = plugin.process_message(&pack).await;

        if let Some(start) = start {
            self.stats.record_duration(start.elapsed());
        }

        match outcome {
            ProcessOutcome::Success => {
                self.stats.record_success();
                pack.deliver_result(DeliveryResult::Success);
                pack.release();
            }
            ProcessOutcome::Recoverable => {
                self.stats.record_failure();
                let reason = plugin.last_error().unwrap_or("recoverable failure").to_string();
                warn!(runner = %self.name, %reason, "plugin reported recoverable failure");
                pack.deliver_result(DeliveryResult::Recoverable(reason));
                pack.release();
            }
            ProcessOutcome::Fatal => {
                self.stats.record_failure();
                let reason = plugin.last_error().unwrap_or("fatal failure").to_string();
                pack.deliver_result(DeliveryResult::Recoverable(reason.clone()));
                pack.release();
                anyhow::bail!("plugin {} returned fatal outcome: {reason}", self.name);
            }
        }
        Ok(())
    }

    /// Returns `Ok(true)` if the caller should stop the run loop.
    fn handle_outcome<P: ScriptPlugin>(&self, plugin: &P, outcome: ProcessOutcome) -> anyhow::Result<bool> {
        match outcome {
            ProcessOutcome::Success => Ok(false),
            ProcessOutcome::Recoverable => {
                self.stats.record_failure();
                warn!(runner = %self.name, "timer_event reported recoverable failure");
                Ok(false)
            }
            ProcessOutcome::Fatal => {
                self.stats.record_failure();
                let reason = plugin.last_error().unwrap_or("fatal failure").to_string();
                anyhow::bail!("plugin {} timer_event returned fatal outcome: {reason}", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heka_core::pack::PackPool;
    use heka_sandbox::{SandboxError, UsageKind, UsageStat};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPlugin {
        calls: AtomicUsize,
        fatal_after: Option<usize>,
    }

    #[async_trait]
    impl ScriptPlugin for CountingPlugin {
        async fn init(&mut self, _data_path: &str) -> Result<(), SandboxError> {
            Ok(())
        }

        async fn process_message(&mut self, _pack: &PackRef) -> ProcessOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fatal_after == Some(n) {
                ProcessOutcome::Fatal
            } else {
                ProcessOutcome::Success
            }
        }

        async fn timer_event(&mut self, _nanoseconds: i64) -> ProcessOutcome {
            ProcessOutcome::Success
        }

        async fn destroy(&mut self, _data_path: &str) -> Result<(), SandboxError> {
            Ok(())
        }

        fn usage(&self, _kind: UsageKind, _stat: UsageStat) -> u64 {
            0
        }

        fn last_error(&self) -> Option<&str> {
            Some("boom")
        }
    }

    #[tokio::test]
    async fn processes_packs_until_inbox_closes() {
        let pool = PackPool::new(4);
        let owned = pool.acquire().await;
        let pack_ref = owned.freeze(0);

        let (tx, rx) = mpsc::channel(4);
        tx.send(pack_ref).await.unwrap();
        drop(tx);

        let runner = DestinationRunner::new("counter", Duration::from_secs(3600));
        let mut plugin = CountingPlugin {
            calls: AtomicUsize::new(0),
            fatal_after: None,
        };

        runner.run(&mut plugin, rx, None).await.unwrap();
        assert_eq!(runner.stats.processed(), 1);
    }

    #[tokio::test]
    async fn fatal_outcome_stops_the_loop_with_an_error() {
        let pool = PackPool::new(4);
        let owned = pool.acquire().await;
        let pack_ref = owned.freeze(0);

        let (tx, rx) = mpsc::channel(4);
        tx.send(pack_ref).await.unwrap();

        let runner = DestinationRunner::new("fatal-plugin", Duration::from_secs(3600));
        let mut plugin = CountingPlugin {
            calls: AtomicUsize::new(0),
            fatal_after: Some(1),
        };

        let result = runner.run(&mut plugin, rx, None).await;
        assert!(result.is_err());
        assert_eq!(runner.stats.failures(), 1);
    }

    struct FatalOnPayload {
        processed: AtomicUsize,
    }

    #[async_trait]
    impl ScriptPlugin for FatalOnPayload {
        async fn init(&mut self, _data_path: &str) -> Result<(), SandboxError> {
            Ok(())
        }

        async fn process_message(&mut self, pack: &PackRef) -> ProcessOutcome {
            self.processed.fetch_add(1, Ordering::SeqCst);
            if pack.message().payload == "FATAL" {
                ProcessOutcome::Fatal
            } else {
                ProcessOutcome::Success
            }
        }

        async fn timer_event(&mut self, _nanoseconds: i64) -> ProcessOutcome {
            ProcessOutcome::Success
        }

        async fn destroy(&mut self, _data_path: &str) -> Result<(), SandboxError> {
            Ok(())
        }

        fn usage(&self, _kind: UsageKind, _stat: UsageStat) -> u64 {
            0
        }

        fn last_error(&self) -> Option<&str> {
            Some("payload was FATAL")
        }
    }

    #[tokio::test]
    async fn scenario_s5_fatal_plugin_halts_runner_and_drops_trailing_packs() {
        let pool = PackPool::new(4);
        let (tx, rx) = mpsc::channel(4);

        for payload in ["fine", "FATAL", "should-not-run"] {
            let mut owned = pool.acquire().await;
            *owned.message_mut() = heka_core::Message::new("evt", payload);
            tx.send(owned.freeze(0)).await.unwrap();
        }
        drop(tx);

        let runner = DestinationRunner::new("fatal-output", Duration::from_secs(3600));
        let mut plugin = FatalOnPayload {
            processed: AtomicUsize::new(0),
        };

        let result = runner.run(&mut plugin, rx, None).await;
        let err = result.unwrap_err();
        assert_eq!(plugin.processed.load(Ordering::SeqCst), 2);

        let report = crate::report::TerminalReport {
            plugin_name: runner.name().to_string(),
            reason: err.to_string(),
            restarts_attempted: 0,
        };
        let msg = report.into_message();
        assert_eq!(msg.type_, crate::report::TERMINAL_MESSAGE_TYPE);
    }
}
