//! Transport error types.

/// Errors from a single upstream request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed, reset, or the body could not be read
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Request did not finish within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Access token rejected
    #[error("unauthorized: check PID_API_KEY")]
    Unauthorized,

    /// Client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout => true,
            TransportError::Http { status, .. } => *status == 429 || *status >= 500,
            TransportError::Unauthorized | TransportError::InvalidConfig(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
