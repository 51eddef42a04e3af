//! # Heka Core
//!
//! Foundational types shared by every other crate in the workspace: the
//! [`Message`]/[`Field`] model, its protobuf wire codec and frame format, and the
//! [`PackPool`]/[`OwnedPack`]/[`PackRef`] carrier that moves a message through the
//! pipeline under pool-backed backpressure.
//!
//! Nothing in this crate knows about matchers, splitters, decoders, or runners —
//! those live in their own crates and depend on this one.

pub mod error;
pub mod field;
pub mod framing;
pub mod message;
pub mod pack;
mod proto;

pub use error::Error;
pub use field::{Field, FieldScalar, FieldValue};
pub use message::{Message, Var};
pub use pack::{DeliveryResult, OwnedPack, PackPool, PackRef};
pub use proto::{PbField, PbHeader, PbHmacHashFunction, PbMessage, PbValueType};
