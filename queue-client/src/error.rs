//! Error types for the GitLab client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the GitLab API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body returned by the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Pagination did not terminate
    #[error("Pagination exceeded {0} pages")]
    PageLimit(u32),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if this error is an authentication or authorization failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::ApiError { status: 401 | 403, .. })
    }

    /// Check if retrying the same request may succeed
    ///
    /// Connection failures, timeouts, rate limiting (429) and server errors
    /// are transient. Other 4xx responses and undecodable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::ApiError { status: 429, .. } => true,
            Self::ApiError { .. } => self.is_server_error(),
            Self::ParseError(_) | Self::PageLimit(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let not_found = ClientError::api_error(404, "404 Project Not Found");
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());
        assert!(!not_found.is_transient());

        let unavailable = ClientError::api_error(503, "Service Unavailable");
        assert!(unavailable.is_server_error());
        assert!(unavailable.is_transient());
    }

    #[test]
    fn test_rate_limit_is_transient() {
        let limited = ClientError::api_error(429, "Retry later");
        assert!(limited.is_client_error());
        assert!(limited.is_transient());
    }

    #[test]
    fn test_auth_errors_are_fatal() {
        for status in [401, 403] {
            let err = ClientError::api_error(status, "401 Unauthorized");
            assert!(err.is_auth_error());
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn test_parse_errors_are_fatal() {
        assert!(!ClientError::ParseError("bad json".to_string()).is_transient());
        assert!(!ClientError::PageLimit(1000).is_transient());
    }

    #[test]
    fn test_api_error_message() {
        let err = ClientError::api_error(500, "boom");
        assert_eq!(err.to_string(), "API error (status 500): boom");
    }
}
