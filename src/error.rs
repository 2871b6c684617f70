use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

/// Failures raised by the transport before the orchestrator is reached.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("URL cannot be null or empty.")]
    MissingUrl,

    #[error("Authorization header required")]
    Unauthorized,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingUrl => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// What went wrong inside a backend call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The deadline elapsed or the caller cancelled.
    #[error("operation timed out")]
    Timeout,

    /// Transport-level failure: connection error or non-2xx status.
    #[error("{0}")]
    Network(String),

    /// The body arrived but could not be turned into text.
    #[error("{0}")]
    Conversion(String),

    #[error("document is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(err.to_string().replace('\n', " "))
        }
    }
}

/// Stable classification of a failed scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BadScheme,
    Timeout,
    NetworkFailure,
    Unexpected,
}

impl FailureKind {
    /// Advisory wire status for the transport.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FailureKind::BadScheme => StatusCode::BAD_REQUEST,
            FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FailureKind::NetworkFailure => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&BackendError> for FailureKind {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Timeout => FailureKind::Timeout,
            BackendError::Network(_) => FailureKind::NetworkFailure,
            BackendError::Conversion(_) | BackendError::TooLarge { .. } => FailureKind::Unexpected,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_status_codes() {
        assert_eq!(FailureKind::BadScheme.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(FailureKind::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(FailureKind::NetworkFailure.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(FailureKind::Unexpected.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_backend_error_classification() {
        assert_eq!(FailureKind::from(&BackendError::Timeout), FailureKind::Timeout);
        assert_eq!(FailureKind::from(&BackendError::Network("refused".into())), FailureKind::NetworkFailure);
        assert_eq!(FailureKind::from(&BackendError::Conversion("bad xref".into())), FailureKind::Unexpected);
        assert_eq!(FailureKind::from(&BackendError::TooLarge { size: 10, limit: 5 }), FailureKind::Unexpected);
    }

    #[test]
    fn test_app_error_status() {
        assert_eq!(AppError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.to_string(), "Authorization header required");
    }
}
