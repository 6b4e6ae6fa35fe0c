use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type. Failures are
/// local to one request: a failed append or summary never affects other
/// in-flight requests or shared state.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The storage call exceeded its bounded timeout. The delivery is dropped,
    /// not retried — telemetry is best-effort.
    #[error("store timeout")]
    StoreTimeout,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.as_str())
            }
            AppError::StoreTimeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_timeout",
                "Storage did not respond in time",
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}
