use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to restore sandbox state from {path}: {reason}")]
    RestoreFailed { path: String, reason: String },

    #[error("failed to persist sandbox state to {path}: {reason}")]
    PersistFailed { path: String, reason: String },
}
