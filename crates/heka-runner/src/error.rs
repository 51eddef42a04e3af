use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("router delivery failed: {0}")]
    Router(#[from] heka_router::RouterError),

    #[error("plugin run loop exited: {0}")]
    Plugin(#[from] anyhow::Error),
}
