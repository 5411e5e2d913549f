use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API-level error taxonomy. Each variant maps to a distinct status and
/// `kind` tag so clients can tell "pick another time" from "fix your
/// input" from "try again later".
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::SlotUnavailable(_) => "slot_unavailable",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::Storage(_) => "storage",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::SlotUnavailable(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidTransition(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Storage(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message,
            "kind": self.kind()
        }));

        (status, body).into_response()
    }
}
