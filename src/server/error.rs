//! Request-level error type.
//!
//! Handlers return `Result<T, ServerError>`; the error renders as `{ "error": message }` with a
//! matching status code. Per-file conversion failures never reach this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use polyglot_forge_core::batch::BatchError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an empty or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The body exceeded the configured size ceiling.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Unexpected failure while orchestrating a batch.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::BadRequest(m) => {
                warn!(message = %m, "[SERVER] Rejected request");
                (StatusCode::BAD_REQUEST, m)
            }
            ServerError::PayloadTooLarge(m) => {
                warn!(message = %m, "[SERVER] Request body too large");
                (StatusCode::PAYLOAD_TOO_LARGE, m)
            }
            ServerError::Internal(m) => {
                error!(message = %m, "[SERVER][ERROR] Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<BatchError> for ServerError {
    fn from(e: BatchError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}
