//! Error types for outbound API calls.

use thiserror::Error;

/// Result type alias for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;

/// Errors raised while calling the messaging API or the quote service.
#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    /// Network-level connectivity failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure
        message: String,
    },

    /// Request timeout exceeded.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Configured timeout in seconds
        timeout_seconds: u64,
    },

    /// API answered with a non-success status.
    #[error("API error: HTTP {status_code}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Response body content
        body: String,
    },

    /// Response body could not be decoded.
    #[error("invalid response body: {message}")]
    Decode {
        /// Decoder error message
        message: String,
    },

    /// Client could not be built from its configuration.
    #[error("invalid client configuration: {message}")]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },
}

impl MessagingError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Maps a transport error, keeping timeouts distinct.
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            Self::timeout(timeout_seconds)
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_reports_status() {
        let err = MessagingError::Api { status_code: 401, body: "unauthorized".into() };
        assert_eq!(err.to_string(), "API error: HTTP 401");
    }

    #[test]
    fn constructors_build_expected_variants() {
        assert!(matches!(MessagingError::timeout(10), MessagingError::Timeout {
            timeout_seconds: 10
        }));
        assert!(matches!(MessagingError::network("refused"), MessagingError::Network { .. }));
    }
}
