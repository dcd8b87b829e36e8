use axum::{
    extract::{Multipart, State},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::filename::secure_filename;
use crate::ingest::{ingest_document, DocumentKind};
use crate::session::{resolve_session, CV_CONTENT};
use crate::state::AppState;
use crate::upload::take_file_field;

#[derive(Debug, Serialize)]
pub struct UploadCvResponse {
    pub message: String,
    pub filename: String,
}

/// POST /upload_cv
///
/// Extracts text from the `cv` file part and stores it in the caller's
/// session, replacing any earlier upload.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Result<(SignedCookieJar, Json<UploadCvResponse>), AppError> {
    let upload = take_file_field(&mut multipart, "cv")
        .await?
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    if upload.filename.is_empty() {
        return Err(AppError::Validation("No file selected".to_string()));
    }

    let kind = DocumentKind::from_filename(&upload.filename)
        .ok_or_else(|| AppError::Validation("Invalid file type".to_string()))?;

    let mut filename = secure_filename(&upload.filename);
    if filename.is_empty() {
        filename = format!("upload.{}", kind.extension());
    }

    let text = ingest_document(&state.config.upload_dir, &filename, kind, upload.data).await?;

    let (session, jar) = resolve_session(jar);
    state.sessions.set(session, CV_CONTENT, text).await;
    info!(session = %session, filename = %filename, "CV stored in session");

    Ok((
        jar,
        Json(UploadCvResponse {
            message: "CV uploaded successfully".to_string(),
            filename,
        }),
    ))
}
