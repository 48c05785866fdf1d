//! `/api` handlers: batch conversion and health.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use polyglot_forge_core::batch::convert_batch;
use polyglot_forge_core::contract::{ConversionRequest, ConversionResult};
use serde_json::{json, Value};
use tracing::info;

use super::error::ServerError;
use super::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/convert", post(convert))
        .route("/health", get(health))
}

/// `POST /api/convert`: convert every file, one after another, and return them in order.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Json<ConversionResult>, ServerError> {
    let Json(request) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(rejection.body_text())
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    })?;

    info!(
        files = request.files.len(),
        target_language = %request.target_language,
        "[SERVER] Conversion request received"
    );
    let result = convert_batch(&request, state.generator.as_ref(), &state.settings).await?;
    Ok(Json(result))
}

/// `GET /api/health`: liveness only, no side effects.
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
