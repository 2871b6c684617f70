use axum::{
    Router,
    extract::{Json, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;
use crate::api::models::ScrapeRequest;
use crate::error::AppError;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/v1/scrape", post(scrape_handler))
        .layer(middleware::from_fn(require_credential))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Rejects every request except the health check that carries no
/// `Authorization` header.
async fn require_credential(request: Request, next: Next) -> Response {
    if request.uri().path() != "/" && !request.headers().contains_key(AUTHORIZATION) {
        tracing::debug!(path = request.uri().path(), "rejected request without credential");
        return AppError::Unauthorized.into_response();
    }
    next.run(request).await
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timeoutSeconds": state.config.timeout_budget.seconds(),
    }))
}

async fn scrape_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ScrapeRequest>,
) -> Response {
    let credential = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if credential.trim().is_empty() {
        return AppError::Unauthorized.into_response();
    }

    // Cancelled when the client goes away and this future is dropped
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.orchestrator.handle(&req, credential, &cancel).await {
        Ok(envelope) => envelope.into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "rejected scrape request");
            err.into_response()
        }
    }
}
