use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{BackendKind, ContentBackend, FetchRequest};
use crate::error::BackendError;

/// Advisory timeout header understood by the reader service.
const TIMEOUT_HEADER: &str = "X-Timeout";

#[derive(Serialize)]
struct ReaderRequest<'a> {
    url: &'a str,
}

/// Forwards pages to the remote reader service and returns its markdown.
#[derive(Debug, Clone)]
pub struct ReaderBackend {
    client: Client,
    endpoint: String,
}

impl ReaderBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: Client::new(), endpoint: endpoint.into() }
    }

    async fn send(&self, request: &FetchRequest<'_>) -> Result<String, BackendError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(request.token)
            .timeout(request.budget)
            .json(&ReaderRequest { url: request.url });

        if let Some(hint) = request.fallback_hint {
            builder = builder.header(TIMEOUT_HEADER, hint.to_string());
        }

        let response = builder.send().await?.error_for_status()?;
        let body = response.text().await?;

        tracing::debug!(url = request.url, bytes = body.len(), "reader returned content");
        Ok(body)
    }
}

#[async_trait]
impl ContentBackend for ReaderBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Reader
    }

    async fn fetch(&self, request: &FetchRequest<'_>, cancel: &CancellationToken) -> Result<String, BackendError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(BackendError::Timeout),
            result = self.send(request) => result,
        }
    }
}
