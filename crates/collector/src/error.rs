//! Error types for chain queries.

use thiserror::Error;

/// Errors returned by [`crate::ChainClient`].
#[derive(Debug, Error)]
pub enum ChainError {
    /// The LCD gateway answered with a non-success status.
    #[error("query failed: {status_code} - {message}")]
    Query {
        /// HTTP status code.
        status_code: u16,
        /// Response body.
        message: String,
    },

    /// Request could not be sent or the response not read.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Query message could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

impl ChainError {
    pub fn query(status_code: u16, message: impl Into<String>) -> Self {
        Self::Query {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true if retrying later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Query { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::Decode(_) | Self::Encode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
