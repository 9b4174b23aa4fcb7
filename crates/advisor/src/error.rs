use thiserror::Error;

/// Errors returned by the chat-completions client.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No API key in config or environment.
    #[error("advisor not configured: set advisor.api_key or MISTRAL_API_KEY")]
    NotConfigured,

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("stream decode error: {0}")]
    Decode(String),
}

impl AdvisorError {
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true for rate limiting and server-side failures.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::NotConfigured | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
