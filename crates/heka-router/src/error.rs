use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("destination inbox for '{0}' has been closed")]
    DestinationClosed(String),

    #[error("durable queue enqueue failed: {0}")]
    Queue(#[from] heka_queue::QueueError),
}
