use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::review::extract::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File extraction failed: {0}")]
    ExtractionFailed(#[source] ExtractError),

    #[error("Resume text too short: {actual} characters (minimum {minimum})")]
    InsufficientText { actual: usize, minimum: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream authentication error: {0}")]
    UpstreamAuth(String),

    #[error("Upstream quota exceeded: {0}")]
    UpstreamQuota(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFileType(media_type) => {
                AppError::UnsupportedFileType(media_type)
            }
            other => AppError::ExtractionFailed(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UnsupportedFileType(media_type) => {
                tracing::info!("Rejected upload with media type '{media_type}'");
                (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_FILE_TYPE",
                    "Unsupported file type. Please upload PDF or TXT files only.".to_string(),
                )
            }
            AppError::ExtractionFailed(e) => {
                tracing::warn!("File processing error: {e}");
                (
                    StatusCode::BAD_REQUEST,
                    "EXTRACTION_FAILED",
                    "Failed to process file. Please try again or paste the text directly."
                        .to_string(),
                )
            }
            AppError::InsufficientText { minimum, .. } => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_TEXT",
                format!(
                    "Please provide sufficient resume text (at least {minimum} characters). \
                     The uploaded file may be empty or corrupted."
                ),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UpstreamAuth(msg) => {
                tracing::error!("LLM authentication error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_AUTH_ERROR",
                    "API key configuration error. Please check your API configuration and try again."
                        .to_string(),
                )
            }
            AppError::UpstreamQuota(msg) => {
                tracing::warn!("LLM quota error: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "UPSTREAM_QUOTA_ERROR",
                    "API quota exceeded. Please try again later.".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The analysis service is unavailable. Please try again later.".to_string(),
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
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
