use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::enhance::sanitize::MalformedJson;
use crate::llm_client::LlmError;
use crate::models::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Config(String),

    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Photo analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("No AI image was produced; basic enhancement required")]
    NeedsBasicEnhancement { analysis: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Config => AppError::Config(LlmError::Config.to_string()),
            LlmError::QuotaExceeded(message) => AppError::QuotaExceeded(message),
            LlmError::Generation(message) => AppError::Generation(message),
            LlmError::Http(e) => AppError::Generation(format!("GenAI request failed: {e}")),
            LlmError::Decode(e) => AppError::MalformedResponse(e.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.0)
    }
}

impl From<MalformedJson> for AppError {
    fn from(err: MalformedJson) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, "CONFIG_ERROR", msg.clone())
            }
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed AI response: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_RESPONSE",
                    "The AI response could not be understood. Please try again.".to_string(),
                )
            }
            AppError::QuotaExceeded(msg) => {
                tracing::warn!("GenAI quota exceeded: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "QUOTA_EXCEEDED",
                    "The AI service is busy right now. Please try again later.".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("GenAI error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::AnalysisFailed(msg) => {
                tracing::error!("Photo analysis failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_FAILED",
                    "The photo could not be analyzed".to_string(),
                )
            }
            AppError::NeedsBasicEnhancement { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NEEDS_BASIC_ENHANCEMENT",
                "No AI image was generated. Use basic enhancement instead.".to_string(),
            ),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                msg.clone(),
            ),
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "Unable to generate PDF".to_string(),
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

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::NeedsBasicEnhancement { analysis } = &self {
            error["analysis"] = json!(analysis);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
