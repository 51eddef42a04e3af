//! The trivial decoder: the record's bytes are already the pack's payload
//! (written by the splitter runner), so all that remains is stamping a
//! message type and logger name onto it. Used for line-oriented inputs with
//! no wire-format framing of their own.

use crate::decoder::{DecodeFailure, Decoder};
use async_trait::async_trait;
use heka_core::pack::{OwnedPack, PackPool};

#[derive(Debug, Clone)]
pub struct PassthroughDecoder {
    message_type: String,
    logger: String,
}

impl PassthroughDecoder {
    pub fn new(message_type: impl Into<String>, logger: impl Into<String>) -> Self {
        PassthroughDecoder {
            message_type: message_type.into(),
            logger: logger.into(),
        }
    }
}

#[async_trait]
impl Decoder for PassthroughDecoder {
    async fn decode(
        &mut self,
        mut pack: OwnedPack,
        _pool: &PackPool,
    ) -> Result<Vec<OwnedPack>, DecodeFailure> {
        let msg = pack.message_mut();
        msg.type_ = self.message_type.clone();
        msg.logger = self.logger.clone();
        Ok(vec![pack])
    }
}
