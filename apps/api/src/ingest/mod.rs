// Document ingestion: validate the uploaded résumé, extract its text.
// The caller stores the text in the session; nothing is kept on disk.

pub mod extract;
pub mod filename;
pub mod handlers;

use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Kind from the text after the last `.`, case-insensitive.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

/// Writes the upload to `<upload_dir>/<uuid>_<name>` and extracts its text.
///
/// The per-request UUID keeps concurrent uploads of the same filename apart.
/// The staged copy is removed once extraction finishes, whatever the outcome.
pub async fn ingest_document(
    upload_dir: &Path,
    sanitized_name: &str,
    kind: DocumentKind,
    data: Bytes,
) -> Result<String, AppError> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let upload_dir = upload_dir.to_path_buf();
    let prefix = format!("{}_", Uuid::new_v4());
    let name = sanitized_name.to_string();

    let text = tokio::task::spawn_blocking(move || -> Result<String, AppError> {
        let mut staged = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&name)
            .rand_bytes(0)
            .tempfile_in(&upload_dir)
            .map_err(|e| AppError::Internal(e.into()))?;
        staged
            .write_all(&data)
            .and_then(|_| staged.flush())
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(extract::extract_text(kind, staged.path())?)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    info!(
        kind = kind.extension(),
        chars = text.chars().count(),
        "Document text extracted"
    );
    Ok(text)
}
