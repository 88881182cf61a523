//! Axum route handler for the photo API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::photo::enhancer::enhance_photo;
use crate::state::AppState;
use crate::upload::read_upload;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub success: bool,
    /// `data:<mime>;base64,<payload>`
    pub photo_url: String,
}

/// POST /api/v1/ai/photo
pub async fn handle_enhance_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>, AppError> {
    let upload = read_upload(&mut multipart, "photo").await?;

    if !upload.content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "Expected an image upload, got '{}'",
            upload.content_type
        )));
    }

    let generated = enhance_photo(state.llm.as_ref(), &upload.data, &upload.content_type).await?;

    Ok(Json(PhotoResponse {
        success: true,
        photo_url: generated.to_data_url(),
    }))
}
