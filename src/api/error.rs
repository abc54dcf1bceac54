use crate::services::exporter::ExportError;
use crate::services::loader::LoadError;
use crate::services::publisher::PublishError;
use crate::services::stash::StashError;
use crate::utils::validation::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFileFormat(String),

    #[error("Could not parse file: {0}")]
    Parse(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Publishing timed out after {0:?}")]
    PublishTimeout(Duration),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<StashError> for AppError {
    fn from(err: StashError) -> Self {
        match err {
            StashError::NotFound(_) => AppError::FileNotFound("File not found".to_string()),
            StashError::InvalidName(_) => AppError::BadRequest(err.to_string()),
            StashError::Io(e) => AppError::Internal(format!("Stash I/O error: {}", e)),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::UnsupportedFormat(_) => AppError::UnsupportedFileFormat(err.to_string()),
            other => AppError::Parse(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err.code {
            "INVALID_MIME_TYPE" => AppError::InvalidContentType(err.message),
            "FILE_TOO_LARGE" => AppError::PayloadTooLarge(err.message),
            _ => AppError::BadRequest(err.message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidContentType(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::FileNotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::UnsupportedFileFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Parse(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Publish(e) => {
                tracing::error!("Publish error: {:?}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::PublishTimeout(after) => {
                tracing::error!("Publish timed out after {:?}", after);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("Remote store did not respond within {}s", after.as_secs()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
