use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy of the conversation core.
///
/// `MalformedEvent` and `ValidationFailure` are recovered locally with a reply
/// to the user. `StorageUnavailable` aborts the in-flight event.
/// `ReferenceDataMissing` aborts only the lookup that needed the table.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Reference data missing: {0}")]
    ReferenceDataMissing(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Validation failure: {0}")]
    ValidationFailure(String),
}

/// HTTP-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BotError> for AppError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::ValidationFailure(msg) | BotError::MalformedEvent(msg) => {
                AppError::Validation(msg)
            }
            BotError::ReferenceDataMissing(msg) => AppError::NotFound(msg),
            BotError::StorageUnavailable(msg) => AppError::Storage(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
