//! Error types for speech delivery

/// Errors surfaced by a speech delivery path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    /// Nothing left to speak after sanitization
    #[error("no text to read")]
    NoContent,

    /// Network or playback failure
    #[error("speech delivery failed: {0}")]
    Delivery(String),

    /// Delivery path cannot handle the request
    #[error("unsupported speech request: {0}")]
    Unsupported(String),
}

impl SpeechError {
    /// Create delivery error
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery(message.into())
    }

    /// Check if the error should be shown to the user as "nothing to read"
    #[inline]
    #[must_use]
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        Self::Delivery(err.to_string())
    }
}

impl From<std::io::Error> for SpeechError {
    fn from(err: std::io::Error) -> Self {
        Self::Delivery(err.to_string())
    }
}

/// Result type alias for speech operations
pub type SpeechResult<T> = Result<T, SpeechError>;
