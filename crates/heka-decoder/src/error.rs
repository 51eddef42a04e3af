use thiserror::Error;

/// A decode failure; the input runner attaches this to the original pack and
/// routes it to the configured error-output or recycles it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record failed schema decode: {0}")]
    Malformed(String),

    #[error("decoder requested an additional pack but the pool is exhausted")]
    PoolExhausted,

    #[error(transparent)]
    Core(#[from] heka_core::Error),
}
