//! Transport error types.

use std::sync::Arc;

/// The exchange could not be completed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// Connection, TLS, or body read failure.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// The HTTP client could not be built.
    #[error("client setup failed: {0}")]
    Client(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TransportError::Timeout } else { TransportError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TransportError::Timeout.to_string(), "request timeout");
        let err = TransportError::Client("no tls backend".to_string());
        assert!(err.to_string().contains("no tls backend"));
    }
}
