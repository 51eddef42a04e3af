use thiserror::Error;

/// Splitter-level failures. `EndOfStream` is not a
/// failure — callers check for it specifically to distinguish clean EOF from a
/// transport error.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("end of stream")]
    EndOfStream,

    #[error("transport read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record exceeds max-message-size and keep-truncated is not set")]
    RecordTooLarge,

    #[error("frame decode failed: {0}")]
    Framing(#[from] heka_core::Error),
}
