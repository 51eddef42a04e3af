//! The fixed host-side contract a script plugin sandbox exposes.
//! Heka treats the sandbox runtime itself as an opaque collaborator; this
//! trait is the entire surface the runner is allowed to depend on.

use crate::error::SandboxError;
use crate::outcome::ProcessOutcome;
use crate::usage::{UsageKind, UsageStat};
use async_trait::async_trait;
use heka_core::pack::PackRef;

#[async_trait]
pub trait ScriptPlugin: Send {
    /// Restore preserved state from `data_path`; an empty path means start fresh.
    async fn init(&mut self, data_path: &str) -> Result<(), SandboxError>;

    /// Process one message. The pack is read-only here: a script plugin
    /// never mutates a message that has already been frozen for routing.
    async fn process_message(&mut self, pack: &PackRef) -> ProcessOutcome;

    /// Same return semantics as `process_message`, driven by the runner's
    /// ticker rather than an inbound pack.
    async fn timer_event(&mut self, nanoseconds: i64) -> ProcessOutcome;

    /// Persist state to `data_path`; an empty path discards it.
    async fn destroy(&mut self, data_path: &str) -> Result<(), SandboxError>;

    fn usage(&self, kind: UsageKind, stat: UsageStat) -> u64;

    /// Textual description of the most recent failure, if any.
    fn last_error(&self) -> Option<&str>;
}
