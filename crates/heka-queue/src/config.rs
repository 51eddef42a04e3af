use std::path::PathBuf;

/// What happens when a queue's on-disk footprint exceeds `max_total_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// New enqueues wait until acked records are pruned and space frees up.
    Backpressure,
    /// The oldest segment is discarded, even if it holds unacked records.
    DropOldest,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub dir: PathBuf,
    pub max_segment_bytes: u64,
    pub max_total_bytes: u64,
    pub capacity_policy: CapacityPolicy,
}

impl QueueConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        QueueConfig {
            dir: dir.into(),
            max_segment_bytes: 16 * 1024 * 1024,
            max_total_bytes: 256 * 1024 * 1024,
            capacity_policy: CapacityPolicy::Backpressure,
        }
    }
}
