//! Error kinds returned by assistant operations.
//!
//! Handlers never see panics or raw I/O errors: every operation returns an
//! [`AssistError`] and the API layer maps its kind onto an HTTP status.

use thiserror::Error;

/// Failure raised by the generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no text")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AssistError {
    /// Missing or invalid request input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Gemini API error: {0}")]
    Generation(#[from] GenerationError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl AssistError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AssistError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AssistError::NotFound(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AssistError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type AssistResult<T> = Result<T, AssistError>;
