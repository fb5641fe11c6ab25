use thiserror::Error;

/// Rejection of a control command. No state is changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("url is already tracked: {0}")]
    AlreadyTracked(String),
    #[error("no target at position {} (tracking {len})", .index + 1)]
    InvalidIndex { index: usize, len: usize },
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
