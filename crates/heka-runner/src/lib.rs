//! # Heka Runner
//!
//! The plugin-runner lifecycle harness: wraps input, filter, and
//! output plugin instances, mediating between their lifecycle and the rest
//! of the pipeline — restart policy, process-message counters, terminal
//! reporting, and the splitter/decoder pairing an input owns per stream.

mod destination_runner;
mod error;
mod input_runner;
mod report;
mod restart;
mod state;
mod stats;
mod stream_context;
mod supervisor;

pub use destination_runner::{DestinationRunner, InjectHandle};
pub use error::RunnerError;
pub use input_runner::InputRunner;
pub use report::{TerminalReport, TERMINAL_MESSAGE_TYPE};
pub use restart::{RestartDecision, RestartPolicy, RestartTracker};
pub use state::{LifecycleState, RunnerState};
pub use stats::RunnerStats;
pub use stream_context::StreamContext;
pub use supervisor::supervise;
