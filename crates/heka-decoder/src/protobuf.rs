//! The reference decoder: reconstitutes a framed Heka protobuf payload back
//! into a [`Message`] in place. Used whenever an input already speaks the
//! native wire format, as opposed to a foreign record format.

use crate::decoder::{DecodeFailure, Decoder};
use crate::error::DecodeError;
use async_trait::async_trait;
use heka_core::pack::{OwnedPack, PackPool};
use heka_core::Message;

#[derive(Debug, Default)]
pub struct ProtobufDecoder;

#[async_trait]
impl Decoder for ProtobufDecoder {
    async fn decode(
        &mut self,
        mut pack: OwnedPack,
        _pool: &PackPool,
    ) -> Result<Vec<OwnedPack>, DecodeFailure> {
        let raw: Vec<u8> = match pack.message().msg_bytes() {
            Some(b) => b.to_vec(),
            None => pack.message().payload.clone().into_bytes(),
        };

        match Message::decode_payload(&raw) {
            Ok(decoded) => {
                *pack.message_mut() = decoded;
                Ok(vec![pack])
            }
            Err(err) => Err(DecodeFailure {
                pack,
                error: DecodeError::Core(err),
            }),
        }
    }
}
