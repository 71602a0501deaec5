//! Boundary error taxonomy.
//!
//! Every failure a handler can surface maps to exactly one of these
//! variants; the `IntoResponse` impl is the single place HTTP status
//! codes are assigned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No resolvable identity on the request (missing or malformed
    /// `Authorization: Bearer` header).
    #[error("Not authenticated")]
    Authentication,

    /// Document absent, not owned by the caller, or the referenced owner
    /// record is missing. Ownership mismatch is deliberately reported the
    /// same way as non-existence.
    #[error("{0}")]
    NotFound(String),

    /// Malformed request body or an out-of-range section index.
    #[error("{0}")]
    Validation(String),

    /// Backend I/O failure. The underlying message is echoed to the caller.
    #[error("{0}")]
    Persistence(anyhow::Error),
}

impl From<anyhow::Error> for ServiceError {
    fn from(e: anyhow::Error) -> Self {
        ServiceError::Persistence(e)
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Persistence(e.into())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Persistence(e.into())
    }
}

// Malformed request bodies go through the same `{"error": ...}` envelope
// as every other failure instead of axum's plain-text rejection.
impl From<axum::extract::rejection::JsonRejection> for ServiceError {
    fn from(e: axum::extract::rejection::JsonRejection) -> Self {
        ServiceError::Validation(e.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Authentication => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Persistence(e) => {
                error!(err = %e, "persistence failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
