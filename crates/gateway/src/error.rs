//! API error type mapping to HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use askrelay_core::error::AuditError;

/// Error returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed client input.
    #[error("{0}")]
    Validation(&'static str),

    /// The audit store is not wired up.
    #[error("supabase_not_configured")]
    NotConfigured,

    /// The audit store answered with an error.
    #[error("db_error: {0}")]
    Dependency(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub const CHAT_FIELDS_REQUIRED: &str = "Missing required fields: question and session_identifier";
pub const HISTORY_SESSION_REQUIRED: &str =
    "Missing required query parameter: session_identifier";

impl From<AuditError> for ApiError {
    fn from(e: AuditError) -> Self {
        match e {
            AuditError::NotConfigured => ApiError::NotConfigured,
            other => ApiError::Dependency(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "ok": false, "error": "supabase_not_configured" }),
            ),
            ApiError::Dependency(detail) => {
                error!(detail = %detail, "Audit query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "error": "db_error", "detail": detail }),
                )
            }
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
