use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the Hopper application
#[derive(Error, Debug)]
pub enum HopperError {
    // Proxy pool errors
    #[error("Invalid proxy address: {0}")]
    InvalidProxyAddress(String),

    #[error("No proxies configured")]
    NoProxiesConfigured,

    #[error("All proxies failed: {last}")]
    AllProxiesFailed { last: String },

    #[error("Max attempts exceeded after {attempts} attempts: {last}")]
    MaxAttemptsExceeded { attempts: u32, last: String },

    // Per-attempt errors (absorbed by the retry loop)
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Hopper operations
pub type Result<T> = std::result::Result<T, HopperError>;

impl HopperError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            HopperError::InvalidRequest(_) | HopperError::InvalidProxyAddress(_) => {
                StatusCode::BAD_REQUEST
            }

            // 502 Bad Gateway
            HopperError::AllProxiesFailed { .. }
            | HopperError::MaxAttemptsExceeded { .. }
            | HopperError::Transport(_)
            | HopperError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            HopperError::NoProxiesConfigured => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            HopperError::InvalidConfig(_) | HopperError::Io(_) | HopperError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// Implement IntoResponse for API error responses
impl IntoResponse for HopperError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

// Convert from URL parse errors
impl From<url::ParseError> for HopperError {
    fn from(err: url::ParseError) -> Self {
        HopperError::InvalidProxyAddress(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_code_mapping() {
        assert_eq!(
            HopperError::InvalidRequest("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HopperError::InvalidProxyAddress("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HopperError::NoProxiesConfigured.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            HopperError::AllProxiesFailed {
                last: "connect refused".to_string()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            HopperError::MaxAttemptsExceeded {
                attempts: 4,
                last: "timed out".to_string()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            HopperError::UpstreamStatus(404).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            HopperError::InvalidConfig("bad".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_client_server_helpers() {
        assert!(HopperError::InvalidRequest("bad".to_string()).is_client_error());
        assert!(!HopperError::InvalidRequest("bad".to_string()).is_server_error());

        assert!(HopperError::NoProxiesConfigured.is_server_error());
        assert!(!HopperError::NoProxiesConfigured.is_client_error());
    }

    #[test]
    fn test_error_messages_carry_last_attempt_error() {
        let err = HopperError::AllProxiesFailed {
            last: "connection reset by peer".to_string(),
        };
        assert!(err.to_string().contains("connection reset by peer"));

        let err = HopperError::MaxAttemptsExceeded {
            attempts: 6,
            last: "Upstream returned status 503".to_string(),
        };
        assert!(err.to_string().contains("6 attempts"));
        assert!(err.to_string().contains("503"));
    }
}
