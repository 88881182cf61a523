//! Axum route handler for PDF export.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::models::parse_cv;
use crate::render::pdf::render_pdf;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub cv: Value,
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

/// POST /api/v1/export
///
/// Input that does not fit the CV schema fails the whole export with a 400.
pub async fn handle_export_pdf(
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let cv = parse_cv(request.cv).map_err(|e| {
        warn!("Export rejected: {e}");
        AppError::Validation("Unable to generate PDF".to_string())
    })?;

    let rendered = tokio::task::spawn_blocking(move || render_pdf(&cv))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF render task failed: {e}")))?
        .map_err(|e| AppError::Render(e.to_string()))?;

    let disposition = HeaderValue::from_str(&content_disposition(&rendered.filename))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid Content-Disposition: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("private, max-age=0, no-cache"),
            ),
        ],
        rendered.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("Ada-Lovelace-CV.pdf"),
            "attachment; filename=\"Ada-Lovelace-CV.pdf\"; filename*=UTF-8''Ada-Lovelace-CV.pdf"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("Zoë-\"Q\"-CV.pdf");
        assert!(value.starts_with("attachment; filename=\"Zo_-_Q_-CV.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''Zo%C3%AB-%22Q%22-CV.pdf"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
