//! # Heka Decoder
//!
//! Transforms a splitter-delimited record into zero, one, or many decoded
//! packs. [`Decoder`] is the pluggable contract; [`ProtobufDecoder`]
//! reconstitutes the native wire format and is the framework's reference
//! implementation.

mod decoder;
mod error;
mod passthrough;
mod protobuf;

pub use decoder::{DecodeFailure, Decoder};
pub use error::DecodeError;
pub use passthrough::PassthroughDecoder;
pub use protobuf::ProtobufDecoder;
