//! Audio transcription: uploaded clip → recording → speech provider → transcript.

use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

pub mod google;
pub mod recording;

use recording::Recording;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// The provider answered but produced no transcript.
    #[error("speech was not recognized")]
    Unintelligible,

    /// Network failure, non-success status, or a response we could not read.
    #[error("{0}")]
    Request(String),
}

/// Speech-to-text backend. Carried in `AppState` as `Arc<dyn SpeechRecognizer>`.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, recording: &Recording) -> Result<String, TranscriptionError>;
}

/// Stages the upload in a scoped `.wav` temp file, decodes it, and asks the
/// recognizer for a transcript. The temp file is removed on every path.
pub async fn transcribe_upload(
    recognizer: &dyn SpeechRecognizer,
    audio: Bytes,
) -> Result<String, AppError> {
    let recording = tokio::task::spawn_blocking(move || -> Result<Recording, AppError> {
        let mut file = tempfile::Builder::new()
            .prefix("question-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| AppError::Internal(e.into()))?;
        file.write_all(&audio)
            .and_then(|_| file.flush())
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(Recording::load(file.path())?)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    info!(
        sample_rate = recording.sample_rate,
        duration_secs = recording.duration_secs(),
        "Audio clip loaded"
    );

    if recording.is_empty() {
        return Err(AppError::AudioUnintelligible);
    }

    let transcript = recognizer.recognize(&recording).await?;
    info!(chars = transcript.len(), "Transcription completed");
    Ok(transcript)
}
