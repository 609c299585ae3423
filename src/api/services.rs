use axum::{Json, body::Body, extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse};
use tracing::info;

use super::{
    error::ApiError,
    models::{HealthResponse, QrRequest, QrResponse},
    state::AppState,
    utils::{read_json, require_json},
    validation::validate_url,
};

/// QR generation endpoint (POST /generate-qr/)
///
/// 1. Validate the submitted URL and derive its file name
/// 2. Render the QR code as PNG
/// 3. Commit it to the repository under `publish.directory`
/// 4. Return the GitHub Pages URL of the committed image
///
/// Invalid URLs are answered with 400. Any render or publish failure becomes a
/// generic 500; the detail only goes to the log.
pub async fn generate_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let result = generate(&state, &headers, body).await;

    match &result {
        Ok(_) => state.metrics.generated(),
        Err(err) if err.status_code().is_client_error() => state.metrics.rejected(),
        Err(_) => state.metrics.failed(),
    }

    result.map(|response| (StatusCode::OK, Json(response)))
}

async fn generate(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<QrResponse, ApiError> {
    require_json(headers)?;
    let request: QrRequest = read_json(body, state.config.server.max_body_bytes).await?;

    let target = validate_url(&request.url, &state.config.validation)?;
    let path = target.asset_path(&state.config.publish.directory);
    info!(url = %target.url, %path, "Generating QR code");

    let png = state.renderer.render(&target.url)?;
    let published = state.publisher.publish(&path, &png).await?;

    Ok(QrResponse {
        qr_code_url: published.public_url,
    })
}

/// Health check endpoint (GET /health)
///
/// Reports liveness, the configured store and request counters. The remote
/// store itself is not contacted.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        store: state.store_kind.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        counters: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
