//! The splitter runner / decoder runner pairing an [`InputRunner`] owns for
//! one byte stream: a per-stream, optionally stateful decoding context. The
//! splitter runner is the only legitimate way to push bytes into a decoder
//! path.
//!
//! [`InputRunner`]: crate::input_runner::InputRunner

use heka_decoder::Decoder;
use heka_splitter::Splitter;

pub struct StreamContext<S, D> {
    pub splitter: S,
    pub decoder: D,
    pub use_message_bytes: bool,
}

impl<S: Splitter, D: Decoder> StreamContext<S, D> {
    pub fn new(splitter: S, decoder: D, use_message_bytes: bool) -> Self {
        StreamContext {
            splitter,
            decoder,
            use_message_bytes,
        }
    }
}
