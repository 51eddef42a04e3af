use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("uuid field is not exactly 16 bytes")]
    MalformedUuid,

    #[error("protobuf decode failed: {0}")]
    ProtoDecode(#[source] prost::DecodeError),

    #[error("frame header malformed: {0}")]
    MalformedHeader(String),

    #[error("frame authentication failed")]
    AuthenticationFailed,

    #[error("frame exceeds maximum message size ({0} > {1})")]
    FrameTooLarge(usize, usize),
}
