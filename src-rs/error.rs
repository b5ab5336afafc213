use thiserror::Error;

use crate::cons::provider_cons::LLMProvider;

/// Errors raised while turning a provider response into a review.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// A chunk lacked a field its provider contract requires.
    #[error("malformed {provider} chunk: missing `{path}`")]
    MalformedChunk {
        provider: LLMProvider,
        path: &'static str,
    },

    /// The transport failed mid-stream. `partial` holds the text accumulated
    /// before the failure.
    #[error("stream interrupted after {received} chunks: {cause}")]
    StreamInterrupted {
        partial: String,
        received: u64,
        cause: anyhow::Error,
    },

    #[error("file index {index} out of range ({len} files)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown prompt template: {0}")]
    UnknownTemplate(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReviewError {
    /// Text produced before the error, if the error carries any.
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            ReviewError::StreamInterrupted { partial, .. } => Some(partial.as_str()),
            _ => None,
        }
    }
}
