//! Reading a single named file out of a multipart upload.

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Returns the first field called `field_name`. Other fields are skipped.
pub async fn read_upload(multipart: &mut Multipart, field_name: &str) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?;

        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        info!(field = field_name, file_name = %file_name, content_type = %content_type, bytes = data.len(), "File uploaded");
        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }

    Err(AppError::Validation(format!("Missing '{field_name}' file field")))
}
