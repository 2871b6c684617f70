use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::models::{ErrorEnvelope, ResponseEnvelope, ScrapeData, ScrapeMetadata, ScrapeResponse};
use crate::error::FailureKind;

pub fn success(source_url: &str, markdown: String) -> ResponseEnvelope {
    let metadata = ScrapeMetadata {
        source_url: source_url.to_string(),
        title: source_url.to_string(),
        description: "Scraped content".to_string(),
        language: "en".to_string(),
        status_code: StatusCode::OK.as_u16(),
    };

    ResponseEnvelope::Success(ScrapeResponse {
        success: true,
        data: ScrapeData { markdown, html: String::new() },
        metadata,
    })
}

pub fn error(kind: FailureKind, message: String) -> ResponseEnvelope {
    ResponseEnvelope::Error(ErrorEnvelope { kind, error: message })
}

impl ResponseEnvelope {
    /// Wire status for this envelope.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResponseEnvelope::Success(_) => StatusCode::OK,
            ResponseEnvelope::Error(envelope) => envelope.kind.status_code(),
        }
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_defaults() {
        let envelope = success("https://example.com", "hello".into());
        let ResponseEnvelope::Success(response) = &envelope else {
            panic!("expected success envelope");
        };
        assert!(response.success);
        assert_eq!(response.data.html, "");
        assert_eq!(response.metadata.title, "https://example.com");
        assert_eq!(response.metadata.description, "Scraped content");
        assert_eq!(response.metadata.language, "en");
        assert_eq!(response.metadata.status_code, 200);
        assert_eq!(envelope.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_error_status_follows_kind() {
        assert_eq!(error(FailureKind::BadScheme, "x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error(FailureKind::Timeout, "x".into()).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(error(FailureKind::NetworkFailure, "x".into()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error(FailureKind::Unexpected, "x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
