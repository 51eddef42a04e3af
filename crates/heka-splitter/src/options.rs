/// Options shared by every splitter variant.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Deliver records exceeding buffer capacity in truncated form instead of
    /// dropping them.
    pub keep_truncated: bool,
    /// Write to the pack's `MsgBytes` shadow rather than the decoded payload.
    pub use_message_bytes: bool,
    /// Initial read-ahead buffer size; always bounded by `max_message_size`.
    pub min_buffer_size: usize,
    /// Global cap a single record's buffer may grow to before `keep_truncated`
    /// or a hard error applies.
    pub max_message_size: usize,
    /// Flush a partial trailing record on EOF instead of discarding it.
    pub deliver_incomplete_final: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            keep_truncated: false,
            use_message_bytes: false,
            min_buffer_size: 4096,
            max_message_size: 64 * 1024,
            deliver_incomplete_final: false,
        }
    }
}
