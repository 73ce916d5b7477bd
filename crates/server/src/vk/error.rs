//! VK API errors.

use thiserror::Error;

/// Errors that can occur when talking to the VK API.
#[derive(Debug, Error)]
pub enum VkError {
    /// The request never completed (connection refused, reset, DNS failure).
    #[error("VK transport error: {0}")]
    Transport(String),

    /// VK answered with a structured `error` payload.
    #[error("VK API error {code}: {message}")]
    Upstream {
        /// VK error code.
        code: i64,
        /// Human-readable message from VK.
        message: String,
    },

    /// The response body had a shape we do not understand.
    #[error("VK protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for VkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Protocol(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
