use serde::{Deserialize, Serialize};

use crate::error::{AppError, FailureKind};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()) }
    }

    /// The requested URL, or [`AppError::MissingUrl`] when absent or blank.
    pub fn url(&self) -> Result<&str, AppError> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(AppError::MissingUrl),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeData {
    pub markdown: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ScrapeData,
    pub metadata: ScrapeMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    #[serde(skip)]
    pub kind: FailureKind,
    pub error: String,
}

/// Outcome of one scrape. Serializes to either the success shape or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success(ScrapeResponse),
    Error(ErrorEnvelope),
}

impl ResponseEnvelope {
    pub fn markdown(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Success(response) => Some(&response.data.markdown),
            ResponseEnvelope::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Success(_) => None,
            ResponseEnvelope::Error(envelope) => Some(&envelope.error),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ResponseEnvelope::Success(_) => None,
            ResponseEnvelope::Error(envelope) => Some(envelope.kind),
        }
    }
}
