use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing error: {0}")]
    Framing(#[from] heka_core::Error),

    #[error("checkpoint file is malformed: {0}")]
    MalformedCheckpoint(String),

    #[error("queue capacity ({cap} bytes) exceeded and capacity policy is backpressure")]
    Full { cap: u64 },

    #[error("cursor token does not name a known segment: {0}")]
    UnknownCursor(String),
}
