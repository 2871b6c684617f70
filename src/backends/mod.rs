//! Content-extraction strategies the orchestrator dispatches to.
//!
//! A backend takes a URL and produces plain text or markdown. Which one runs
//! is decided by [`BackendKind::for_url`], a pure predicate on the URL.

pub mod pdf;
pub mod reader;

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;

pub use pdf::{PdfBackend, PdfConverter, PdfExtractConverter};
pub use reader::ReaderBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Pdf,
    Reader,
}

impl BackendKind {
    /// `.pdf` at the end of the path (query and fragment ignored,
    /// ASCII case-insensitive) selects the PDF backend.
    pub fn for_url(url: &str) -> Self {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        let path = url[..end].trim_end().as_bytes();
        if path.len() >= 4 && path[path.len() - 4..].eq_ignore_ascii_case(b".pdf") {
            BackendKind::Pdf
        } else {
            BackendKind::Reader
        }
    }

    /// Message used when the backend hands back nothing but whitespace.
    pub fn empty_result_message(&self) -> &'static str {
        match self {
            BackendKind::Pdf => "Failed to extract content from PDF.",
            BackendKind::Reader => "Failed to extract content using Jina.",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Pdf => "pdf",
            BackendKind::Reader => "reader",
        }
    }
}

/// Everything a backend needs for one call.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    /// Caller credential with any `Bearer ` prefix already removed.
    pub token: &'a str,
    /// Hard deadline for the call.
    pub budget: Duration,
    /// Advisory seconds the remote side may use to abort early.
    pub fallback_hint: Option<u64>,
}

#[async_trait]
pub trait ContentBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Fetch `request.url` and return the extracted text.
    ///
    /// Implementations must stop promptly once `cancel` fires and report
    /// [`BackendError::Timeout`] in that case.
    async fn fetch(&self, request: &FetchRequest<'_>, cancel: &CancellationToken) -> Result<String, BackendError>;
}
