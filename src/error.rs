use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream catalog error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors produced by the upstream fetch layer.
///
/// Kept separate from [`AppError`] and fully `Clone` so coalesced callers
/// sharing one in-flight request can all receive the same failure. Source
/// adapters absorb every variant into an empty result; nothing here crosses
/// the facade boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("response decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transient failures are retried with backoff. 4xx responses are not:
    /// 404 means "no data from this source" and 429 must not be amplified
    /// by this layer.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Network(_) => true,
            FetchError::Status(code) => *code >= 500,
            FetchError::Cancelled | FetchError::Decode(_) => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(FetchError::Status(500).is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Network("connection reset".to_string()).is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Status(400).is_retryable());
        assert!(!FetchError::Status(429).is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
    }
}
