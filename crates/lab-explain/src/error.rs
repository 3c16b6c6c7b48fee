//! Error types for explanation requests
//!
//! These never reach callers of [`crate::ExplanationCache::explain`], which
//! substitutes fallback text; they are visible only at the backend seam.

/// Errors raised by an explanation backend
#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    /// Request could not be sent or timed out
    #[error("explanation transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("explanation backend returned status {status}")]
    Status { status: u16 },

    /// Response body was not the expected JSON shape
    #[error("failed to decode explanation response: {0}")]
    Decode(String),

    /// Backend answered with blank text
    #[error("explanation backend returned an empty response")]
    EmptyResponse,
}

impl ExplainError {
    /// Check if retrying the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::EmptyResponse => false,
        }
    }
}

impl From<reqwest::Error> for ExplainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type alias for explanation requests
pub type ExplainResult<T> = Result<T, ExplainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        assert!(ExplainError::Status { status: 503 }.is_transient());
        assert!(ExplainError::Status { status: 429 }.is_transient());
        assert!(!ExplainError::Status { status: 400 }.is_transient());
        assert!(!ExplainError::EmptyResponse.is_transient());
    }

    #[test]
    fn status_display() {
        let err = ExplainError::Status { status: 502 };
        assert_eq!(err.to_string(), "explanation backend returned status 502");
    }
}
