// crates/network/src/error.rs
//! Error types for network operations

use taleshelf_core::AppError;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The fetched bytes could not be read as audio
    #[error("Could not read audio headers: {0}")]
    Decode(String),

    /// Resilience error
    #[error("Resilience error: {0}")]
    Resilience(#[from] taleshelf_resilience::ResilienceError),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl NetworkError {
    /// Returns true if a later attempt might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Http(_) | NetworkError::Resilience(_) => true,
            NetworkError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => (400..500).contains(status),
            NetworkError::Http(e) => e.status().is_some_and(|s| s.is_client_error()),
            _ => false,
        }
    }
}

impl From<NetworkError> for AppError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Resilience(taleshelf_resilience::ResilienceError::Timeout(d)) => {
                AppError::Timeout {
                    operation: "metadata probe".to_string(),
                    millis: d.as_millis() as u64,
                }
            }
            other => AppError::TransientIo {
                operation: "metadata probe".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taleshelf_core::RecoveryAction;
    use taleshelf_resilience::ResilienceError;

    #[test]
    fn test_error_display() {
        let err = NetworkError::InvalidUrl("test".to_string());
        assert!(err.to_string().contains("Invalid URL"));

        let err = NetworkError::Status {
            url: "https://a.example/x.mp3".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://a.example/x.mp3");
    }

    #[test]
    fn test_retryable_errors() {
        let server = NetworkError::Status {
            url: String::new(),
            status: 503,
        };
        let missing = NetworkError::Status {
            url: String::new(),
            status: 404,
        };
        assert!(server.is_retryable());
        assert!(!missing.is_retryable());
        assert!(missing.is_client_error());
        assert!(!NetworkError::Decode("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_timeout_maps_to_app_timeout() {
        let err: AppError =
            NetworkError::Resilience(ResilienceError::Timeout(Duration::from_secs(5))).into();
        assert!(matches!(err, AppError::Timeout { millis: 5000, .. }));
        assert_eq!(err.recovery_action(), RecoveryAction::ResolveAsUnknown);
    }

    #[test]
    fn test_decode_maps_to_transient_io() {
        let err: AppError = NetworkError::Decode("no tracks".to_string()).into();
        assert_eq!(err.recovery_action(), RecoveryAction::ResolveAsUnknown);
    }
}
