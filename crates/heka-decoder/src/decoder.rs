//! The decoder contract.

use crate::error::DecodeError;
use async_trait::async_trait;
use heka_core::pack::{OwnedPack, PackPool};

/// A pack that failed decoding, carried back to the caller so the input
/// runner can route it to an error-output or recycle it with the error
/// attached — the pack is never silently dropped by the decoder itself.
pub struct DecodeFailure {
    pub pack: OwnedPack,
    pub error: DecodeError,
}

/// Transforms a record's raw bytes into one or more decoded packs.
///
/// A decoder may produce zero, one, or many packs from a single input pack.
/// Multi-pack output reuses `pack` for the first output and requests any
/// further packs from `pool`; implementations that only ever emit at most one
/// pack never need to touch `pool`.
#[async_trait]
pub trait Decoder: Send {
    async fn decode(
        &mut self,
        pack: OwnedPack,
        pool: &PackPool,
    ) -> Result<Vec<OwnedPack>, DecodeFailure>;
}
