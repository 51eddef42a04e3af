//! Terminal reporting: exceeding the restart bound halts the plugin
//! permanently and logs a terminal report.

use heka_core::{Field, Message};

pub const TERMINAL_MESSAGE_TYPE: &str = "heka.sandbox-terminated";

/// Describes why a runner halted permanently after exhausting its restart
/// policy.
#[derive(Debug, Clone)]
pub struct TerminalReport {
    pub plugin_name: String,
    pub reason: String,
    pub restarts_attempted: usize,
}

impl TerminalReport {
    /// Render the report as a message so it can be routed like any other
    /// event — filters/outputs subscribe to it via `Type == "heka.sandbox-terminated"`.
    pub fn into_message(self) -> Message {
        let mut msg = Message::new(TERMINAL_MESSAGE_TYPE, self.reason);
        msg.logger = self.plugin_name;
        msg.severity = 2; // critical
        msg.add_field(Field::integer("restarts_attempted", self.restarts_attempted as i64));
        msg
    }
}
