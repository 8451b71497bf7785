use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("ticket API unreachable: {0}")]
    Transport(String),
    #[error("ticket API responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode ticket API response: {0}")]
    Decode(String),
    #[error("invalid ticket: {0}")]
    InvalidDraft(String),
    #[error("a ticket submission is already in progress")]
    SubmissionInProgress,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Failures of the remote API that the user may retry with the same action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_) | AppError::Status { .. } | AppError::Decode(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
