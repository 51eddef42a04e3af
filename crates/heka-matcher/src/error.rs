use thiserror::Error;

/// Compile-time failure, pointing at the offending token where possible.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("matcher syntax error at {at:?}: {detail}")]
    Syntax { at: String, detail: String },

    #[error("unknown message variable {0:?}")]
    UnknownVar(String),

    #[error("unknown regex template %{0}%")]
    UnknownTemplate(String),

    #[error("invalid regex literal: {0}")]
    InvalidRegex(#[source] regex::Error),

    #[error("trailing input after expression: {0:?}")]
    TrailingInput(String),
}
