//! # Heka Sandbox
//!
//! The host-side half of the embedded script plugin contract.
//! The sandbox runtime itself is an external collaborator; this crate only
//! defines the fixed interface the runner calls through and the latency
//! sampling policy that bounds its overhead.

mod error;
mod outcome;
mod plugin;
mod sampler;
mod usage;

pub use error::SandboxError;
pub use outcome::ProcessOutcome;
pub use plugin::ScriptPlugin;
pub use sampler::LatencySampler;
pub use usage::{UsageKind, UsageStat};
