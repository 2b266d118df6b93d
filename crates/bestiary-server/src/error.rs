//! API error type and its envelope rendering.
//!
//! Every failure leaves the server as `{error, details?, success: false}`:
//!   - validation failures  → 400 with a `details` array of per-field messages
//!   - missing references   → 404
//!   - duplicate links      → 409
//!   - constraint breaches  → 400
//!   - storage faults       → 500 (logged, message passed through)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use bestiary_store::StoreError;

/// One field-level validation failure, serialized into `details`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Errors surfaced by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation failed",
                    "details": details,
                    "success": false,
                })),
            )
                .into_response(),
            ApiError::Store(e) => {
                let status = match &e {
                    StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    StoreError::LinkExists(_) => StatusCode::CONFLICT,
                    StoreError::Constraint(_) => StatusCode::BAD_REQUEST,
                    StoreError::Sqlite(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %e, "storage failure");
                }
                (
                    status,
                    Json(json!({ "error": e.to_string(), "success": false })),
                )
                    .into_response()
            }
        }
    }
}

/// `200 {data, success: true}`.
pub fn ok<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "data": data, "success": true })),
    )
        .into_response()
}

/// `201 {data, success: true}`.
pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "data": data, "success": true })),
    )
        .into_response()
}
