//! Dispatch-and-normalization core.
//!
//! [`Orchestrator::handle`] picks a backend from the URL shape, runs it under
//! the timeout budget, classifies any failure and builds the response
//! envelope. Every expected failure becomes an error envelope; only a missing
//! URL is returned as an `Err`.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::api::models::{ResponseEnvelope, ScrapeRequest};
use crate::api::response;
use crate::backends::{BackendKind, ContentBackend, FetchRequest, PdfBackend, ReaderBackend};
use crate::config::{Config, TimeoutBudget};
use crate::error::{self, BackendError, FailureKind};

pub const BAD_SCHEME_MESSAGE: &str = "Invalid URL scheme for PDF. Must be http or https.";

#[derive(Clone)]
pub struct Orchestrator {
    pdf: Arc<dyn ContentBackend>,
    reader: Arc<dyn ContentBackend>,
    budget: TimeoutBudget,
}

impl Orchestrator {
    pub fn new(pdf: Arc<dyn ContentBackend>, reader: Arc<dyn ContentBackend>, budget: TimeoutBudget) -> Self {
        Self { pdf, reader, budget }
    }

    /// Wire up the production backends.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(PdfBackend::new(config.pdf_max_bytes)),
            Arc::new(ReaderBackend::new(config.reader_endpoint.clone())),
            config.timeout_budget,
        )
    }

    pub async fn handle(
        &self,
        request: &ScrapeRequest,
        credential: &str,
        cancel: &CancellationToken,
    ) -> error::Result<ResponseEnvelope> {
        let url = request.url()?;
        let started = Instant::now();
        let kind = BackendKind::for_url(url);

        if kind == BackendKind::Pdf && !has_http_scheme(url) {
            tracing::warn!(url, "rejected PDF URL with unsupported scheme");
            return Ok(response::error(FailureKind::BadScheme, BAD_SCHEME_MESSAGE.to_string()));
        }

        let fetch = FetchRequest {
            url,
            token: bearer_token(credential),
            budget: self.budget.duration(),
            fallback_hint: self.budget.fallback_hint(),
        };

        let envelope = match self.invoke(kind, &fetch, cancel).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(
                    url,
                    backend = kind.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "successfully scraped URL"
                );
                response::success(url, text)
            }
            Ok(_) => self.unexpected(url, kind.empty_result_message()),
            Err(err) => self.classify(url, &err),
        };

        Ok(envelope)
    }

    async fn invoke(
        &self,
        kind: BackendKind,
        fetch: &FetchRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, BackendError> {
        let backend = match kind {
            BackendKind::Pdf => &self.pdf,
            BackendKind::Reader => &self.reader,
        };
        tracing::debug!(url = fetch.url, backend = backend.kind().name(), "dispatching scrape");

        // The budget bounds the reader; the PDF backend carries its own download timeout.
        let call = async {
            match kind {
                BackendKind::Pdf => backend.fetch(fetch, cancel).await,
                BackendKind::Reader => tokio::time::timeout(fetch.budget, backend.fetch(fetch, cancel))
                    .await
                    .unwrap_or(Err(BackendError::Timeout)),
            }
        };

        // Cancellation wins over a result that is ready on the same poll
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BackendError::Timeout),
            result = call => result,
        }
    }

    fn classify(&self, url: &str, err: &BackendError) -> ResponseEnvelope {
        match FailureKind::from(err) {
            FailureKind::Timeout => {
                tracing::warn!(url, budget_secs = self.budget.seconds(), "request timed out while scraping URL");
                response::error(
                    FailureKind::Timeout,
                    format!(
                        "The request timed out after {} seconds while scraping URL: {}",
                        self.budget.seconds(),
                        url
                    ),
                )
            }
            FailureKind::NetworkFailure => {
                tracing::error!(url, error = %err, "request failed for URL");
                response::error(FailureKind::NetworkFailure, format!("Request failed for URL: {}. Error: {}", url, err))
            }
            FailureKind::BadScheme | FailureKind::Unexpected => self.unexpected(url, &err.to_string()),
        }
    }

    fn unexpected(&self, url: &str, detail: &str) -> ResponseEnvelope {
        tracing::error!(url, error = detail, "unexpected error while scraping URL");
        response::error(FailureKind::Unexpected, format!("An unexpected server error occurred: {}", detail))
    }
}

fn has_http_scheme(url: &str) -> bool {
    let starts_with = |prefix: &str| url.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix));
    starts_with("http://") || starts_with("https://")
}

/// Strip an optional leading `Bearer ` from the forwarded credential.
fn bearer_token(credential: &str) -> &str {
    let credential = credential.trim_start();
    let token = match credential.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => &credential[7..],
        _ => credential,
    };
    token.trim()
}
