//! Axum route handlers for the import API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::import::extract::extract_text;
use crate::import::importer::import_cv;
use crate::models::CvData;
use crate::state::AppState;
use crate::upload::read_upload;

#[derive(Debug, Deserialize)]
pub struct ImportTextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ImportTextResponse {
    pub cv: CvData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileResponse {
    pub cv: CvData,
    pub page_count: usize,
}

/// POST /api/v1/ai/import
pub async fn handle_import_text(
    State(state): State<AppState>,
    Json(request): Json<ImportTextRequest>,
) -> Result<Json<ImportTextResponse>, AppError> {
    let cv = import_cv(state.llm.as_ref(), &request.text).await?;
    Ok(Json(ImportTextResponse { cv }))
}

/// POST /api/v1/ai/import/file
///
/// Accepts a multipart `file` (PDF or text), extracts its text, then imports it.
pub async fn handle_import_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportFileResponse>, AppError> {
    let upload = read_upload(&mut multipart, "file").await?;

    let document = tokio::task::spawn_blocking(move || {
        extract_text(&upload.file_name, &upload.content_type, &upload.data)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Text extraction task failed: {e}")))??;

    let cv = import_cv(state.llm.as_ref(), &document.text()).await?;

    Ok(Json(ImportFileResponse {
        cv,
        page_count: document.page_count,
    }))
}
