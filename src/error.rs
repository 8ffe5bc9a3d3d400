use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

/// Application error type that can be returned from handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    // Caller input errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed JSON: {0}")]
    MalformedData(String),

    // Storage errors
    #[error("Stored data is corrupt: {0}")]
    CorruptData(String),

    #[error("I/O error: {0}")]
    Io(String),

    // Text completion errors
    #[error("Upstream error: {0}")]
    Upstream(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Prefix the message with the entity the failure concerns.
    /// `NotFound` is replaced by the entity itself.
    pub fn context(self, entity: impl Into<String>) -> Self {
        let entity = entity.into();
        match self {
            AppError::NotFound(_) => AppError::NotFound(entity),
            AppError::Conflict(msg) => AppError::Conflict(format!("{}: {}", entity, msg)),
            AppError::CorruptData(msg) => AppError::CorruptData(format!("{}: {}", entity, msg)),
            AppError::Io(msg) => AppError::Io(format!("{}: {}", entity, msg)),
            other => other,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            // 404 Not Found
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "Not found", Some(resource.clone()))
            }

            // 409 Conflict
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),

            // 400 Bad Request
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::MalformedData(msg) => {
                (StatusCode::BAD_REQUEST, "Malformed JSON", Some(msg.clone()))
            }

            // 502 Bad Gateway
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream error", Some(msg.clone()))
            }

            // 500 Internal Server Error
            AppError::CorruptData(msg) => {
                tracing::error!("Corrupt data: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored data is corrupt",
                    Some(msg.clone()),
                )
            }
            AppError::Io(msg) => {
                tracing::error!("I/O error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "I/O error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

// Convenient conversions from common error types

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { path } => AppError::NotFound(path.display().to_string()),
            StoreError::Io { .. } => AppError::Io(err.to_string()),
            StoreError::Malformed { .. } => AppError::CorruptData(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
