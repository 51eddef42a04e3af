//! A minimal output plugin demonstrating the `ScriptPlugin` host contract.
//! Prints each matching message to stdout.

use async_trait::async_trait;
use heka_core::pack::PackRef;
use heka_sandbox::{ProcessOutcome, SandboxError, ScriptPlugin, UsageKind, UsageStat};

pub struct StdoutOutput {
    name: String,
    last_error: Option<String>,
}

impl StdoutOutput {
    pub fn new(name: impl Into<String>) -> Self {
        StdoutOutput {
            name: name.into(),
            last_error: None,
        }
    }
}

#[async_trait]
impl ScriptPlugin for StdoutOutput {
    async fn init(&mut self, _data_path: &str) -> Result<(), SandboxError> {
        Ok(())
    }

    async fn process_message(&mut self, pack: &PackRef) -> ProcessOutcome {
        let msg = pack.message();
        println!("[{}] {} {}: {}", self.name, msg.type_, msg.logger, msg.payload);
        ProcessOutcome::Success
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
        self.last_error.as_deref()
    }
}
