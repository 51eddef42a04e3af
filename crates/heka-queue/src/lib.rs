//! # Heka Queue
//!
//! A per-filter/-output durable append-only log with a cursor checkpoint.
//! Fronts a destination's inbox when the
//! router is configured to spill backpressured packs to disk instead of
//! blocking upstream.

mod config;
mod cursor;
mod error;
mod queue;
mod segment;

pub use config::{CapacityPolicy, QueueConfig};
pub use cursor::Cursor;
pub use error::QueueError;
pub use queue::{DurableQueue, QueuedRecord};
