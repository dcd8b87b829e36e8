use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

/// A file part pulled out of a multipart body.
#[derive(Debug)]
pub struct FileUpload {
    /// Client-supplied filename, possibly empty.
    pub filename: String,
    pub data: Bytes,
}

/// Returns the first file part named `field_name`, skipping everything else.
///
/// Parts without a filename are plain form fields, not files, and are ignored.
pub async fn take_file_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<FileUpload>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;

        tracing::debug!(field = field_name, filename = %filename, bytes = data.len(), "File part received");
        return Ok(Some(FileUpload { filename, data }));
    }
    Ok(None)
}
