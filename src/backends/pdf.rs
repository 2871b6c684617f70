use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use tokio_util::sync::CancellationToken;

use super::{BackendKind, ContentBackend, FetchRequest};
use crate::error::BackendError;

/// Fixed download timeout, independent of the scrape budget.
pub const PDF_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Shared client so downloads reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(PDF_FETCH_TIMEOUT)
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

/// Turns a complete PDF byte stream into UTF-8 text, pages in document order.
pub trait PdfConverter: Send + Sync {
    fn convert(&self, bytes: &[u8]) -> Result<String, BackendError>;
}

/// [`PdfConverter`] backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractConverter;

impl PdfConverter for PdfExtractConverter {
    fn convert(&self, bytes: &[u8]) -> Result<String, BackendError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| BackendError::Conversion(format!("failed to convert PDF: {}", e)))?;
        Ok(pages.concat())
    }
}

/// Downloads PDFs and converts them locally.
#[derive(Clone)]
pub struct PdfBackend {
    client: Client,
    converter: Arc<dyn PdfConverter>,
    max_bytes: u64,
}

impl PdfBackend {
    pub fn new(max_bytes: u64) -> Self {
        Self::with_converter(Arc::new(PdfExtractConverter), max_bytes)
    }

    pub fn with_converter(converter: Arc<dyn PdfConverter>, max_bytes: u64) -> Self {
        Self { client: CLIENT.clone(), converter, max_bytes }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        if let Some(len) = response.content_length()
            && len > self.max_bytes
        {
            return Err(BackendError::TooLarge { size: len, limit: self.max_bytes });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_bytes {
                return Err(BackendError::TooLarge { size: body.len() as u64, limit: self.max_bytes });
            }
        }

        tracing::debug!(url, bytes = body.len(), "downloaded PDF");
        Ok(body)
    }

    async fn convert(&self, body: Vec<u8>) -> Result<String, BackendError> {
        let converter = self.converter.clone();
        tokio::task::spawn_blocking(move || converter.convert(&body))
            .await
            .map_err(|e| BackendError::Conversion(format!("PDF conversion aborted: {}", e)))?
    }
}

#[async_trait]
impl ContentBackend for PdfBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Pdf
    }

    async fn fetch(&self, request: &FetchRequest<'_>, cancel: &CancellationToken) -> Result<String, BackendError> {
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(BackendError::Timeout),
            body = self.download(request.url) => body?,
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(BackendError::Timeout),
            text = self.convert(body) => text,
        }
    }
}
