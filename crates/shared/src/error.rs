//! Error taxonomy shared by the reader, the model client and the chat core.
//!
//! None of these are fatal: every variant is reported to the user and the
//! application stays interactive.

use std::fmt;

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyQuestion,
    AlreadySending,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyQuestion => write!(f, "question is empty"),
            RejectReason::AlreadySending => write!(f, "a request is already in flight"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Unsupported file type: {path}")]
    Unsupported { path: String },

    #[error("Failed to read {path}: {reason}")]
    ReadFailure { path: String, reason: String },

    #[error("Submission rejected: {0}")]
    Rejected(RejectReason),

    #[error("{0}")]
    ModelFailure(String),

    #[error("Index {index} out of range for {len} context items")]
    OutOfRange { index: usize, len: usize },
}

impl ChatError {
    pub fn read_failure(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        ChatError::ReadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn model(reason: impl fmt::Display) -> Self {
        ChatError::ModelFailure(reason.to_string())
    }
}
