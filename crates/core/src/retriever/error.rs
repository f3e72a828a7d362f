//! Error types for the retriever module.

use thiserror::Error;

/// Errors returned by a data provider.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Credentials rejected (HTTP 401/403).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Credentials missing or malformed.
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// Malformed request or unknown dataset/variable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider quota or rate limit hit (HTTP 429).
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider accepted the request but its processing failed.
    #[error("Request rejected by provider: {0}")]
    Rejected(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// Unexpected HTTP status or response body.
    #[error("API error: {message}")]
    Api { status: Option<u16>, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// Creates an API error without an HTTP status.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the same request could succeed if retried later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::ConnectionFailed(_) | Self::Timeout | Self::Io(_) => true,
            Self::Api { status, .. } => status.map(|s| s >= 500).unwrap_or(false),
            Self::Authentication(_)
            | Self::Credentials(_)
            | Self::InvalidRequest(_)
            | Self::Rejected(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RetrievalError::Timeout.is_transient());
        assert!(RetrievalError::RateLimited("quota".into()).is_transient());
        assert!(RetrievalError::ConnectionFailed("refused".into()).is_transient());
        assert!(RetrievalError::Api {
            status: Some(503),
            message: "unavailable".into()
        }
        .is_transient());

        assert!(!RetrievalError::Authentication("bad key".into()).is_transient());
        assert!(!RetrievalError::InvalidRequest("bad variable".into()).is_transient());
        assert!(!RetrievalError::Rejected("no data".into()).is_transient());
        assert!(!RetrievalError::api("garbled reply").is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = RetrievalError::Rejected("variable not found".to_string());
        assert_eq!(
            err.to_string(),
            "Request rejected by provider: variable not found"
        );

        let err = RetrievalError::Api {
            status: Some(502),
            message: "HTTP 502 Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: HTTP 502 Bad Gateway");
    }
}
