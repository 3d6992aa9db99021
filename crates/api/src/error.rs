use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use gatepass_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `gatepass_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Entry request {id} not found"),
                ),
                CoreError::InvalidVisitorPayload(msg) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_VISITOR_PAYLOAD",
                    msg.clone(),
                ),
                CoreError::UnknownResident(id) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNKNOWN_RESIDENT",
                    format!("Resident '{id}' is not registered"),
                ),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::AlreadyResolved { actual } => {
                    // Conflicts carry the actual resolution so a stale
                    // client can reconcile without a second round trip.
                    let body = json!({
                        "error": core.to_string(),
                        "code": "ALREADY_RESOLVED",
                        "resolution": actual,
                    });
                    return (StatusCode::CONFLICT, axum::Json(body)).into_response();
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
