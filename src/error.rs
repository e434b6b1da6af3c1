use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::services::resume_validator::RejectReason;
use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate email or phone number; the field name travels with the error
    /// so the client can attribute the conflict.
    #[error("{field} already belongs to another candidate")]
    Conflict { field: &'static str },

    #[error("Resume rejected: {0}")]
    ResumeRejected(#[from] RejectReason),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::Conflict { field } => (
                StatusCode::CONFLICT,
                json!({
                    "error": format!("A candidate with this {} already exists", field),
                    "field": field,
                }),
            ),
            Error::ResumeRejected(reason) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": reason.to_string(), "field": "resume" }),
            ),
            Error::InvalidTransition(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "field": "status" }),
            ),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "details": err }),
            ),
            Error::Storage(StorageError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "File not found in storage" }),
            ),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Reqwest(err) => {
                tracing::error!(error = ?err, "upstream HTTP failure");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "External service error" }),
                )
            }
            // Fault detail stays in the logs, not the response body.
            Error::Storage(err) => {
                tracing::error!(error = ?err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Storage failure" }),
                )
            }
            Error::Database(err) => {
                tracing::error!(error = ?err, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
            Error::Config(msg) | Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
            Error::Io(err) => {
                tracing::error!(error = ?err, "io failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
            Error::Anyhow(err) => {
                tracing::error!(error = ?err, "unhandled failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
