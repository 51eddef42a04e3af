/// Result of one `process_message` or `timer_event` call into the sandbox.
/// Mirrors the host contract's integer return convention without
/// leaking raw codes past this crate's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Code 0.
    Success,
    /// Negative code: the pack is returned to the caller with `last_error()`
    /// text attached, but the plugin keeps running.
    Recoverable,
    /// Positive code: the plugin is destroyed after this call.
    Fatal,
}

impl ProcessOutcome {
    pub fn from_code(code: i32) -> Self {
        match code.cmp(&0) {
            std::cmp::Ordering::Equal => ProcessOutcome::Success,
            std::cmp::Ordering::Less => ProcessOutcome::Recoverable,
            std::cmp::Ordering::Greater => ProcessOutcome::Fatal,
        }
    }

    pub fn is_fatal(self) -> bool {
        matches!(self, ProcessOutcome::Fatal)
    }
}
