//! Generated protobuf types for the wire schema.
//!
//! `message.rs` never constructs these directly outside of [`crate::message::Message::to_proto`]
//! and [`crate::message::Message::from_proto`]; everywhere else uses the ergonomic
//! [`crate::message::Message`]/[`crate::field::Field`] types.

include!(concat!(env!("OUT_DIR"), "/heka.rs"));

pub use header::HmacHashFunction as PbHmacHashFunction;
pub use message::field::ValueType as PbValueType;
pub use message::Field as PbField;
pub use Header as PbHeader;
pub use Message as PbMessage;
