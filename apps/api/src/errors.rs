use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::extract::ExtractionError;
use crate::llm_client::LlmError;
use crate::speech::recording::RecordingError;
use crate::speech::TranscriptionError;

/// Application-level error type, tagged by the pipeline stage that failed.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not understand audio")]
    AudioUnintelligible,

    #[error("Speech provider error: {0}")]
    SpeechProvider(String),

    #[error("Audio decode error: {0}")]
    AudioDecode(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("Answer generation error: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TranscriptionError> for AppError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::Unintelligible => AppError::AudioUnintelligible,
            TranscriptionError::Request(detail) => AppError::SpeechProvider(detail),
        }
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::AudioDecode(err.to_string())
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::Extraction(err.to_string())
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Generation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::AudioUnintelligible => (
                StatusCode::BAD_REQUEST,
                "Could not understand audio".to_string(),
            ),
            AppError::SpeechProvider(detail) => {
                tracing::error!("Speech provider error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Speech recognition error: {detail}"),
                )
            }
            AppError::AudioDecode(detail) => {
                tracing::error!("Audio decode error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing request: {detail}"),
                )
            }
            AppError::Extraction(detail) => {
                tracing::error!("Text extraction error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Could not extract text from file: {detail}"),
                )
            }
            AppError::Generation(detail) => {
                tracing::error!("Answer generation error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing request: {detail}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing request: {e}"),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_is_bad_request() {
        let (status, body) = render(AppError::Validation("Invalid file type".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid file type" }));
    }

    #[tokio::test]
    async fn test_unintelligible_is_bad_request() {
        let (status, body) = render(TranscriptionError::Unintelligible.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Could not understand audio");
    }

    #[tokio::test]
    async fn test_speech_provider_embeds_detail() {
        let err: AppError = TranscriptionError::Request("quota exceeded".into()).into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Speech recognition error: quota exceeded");
    }

    #[tokio::test]
    async fn test_generation_is_distinct_from_speech() {
        let err: AppError = LlmError::EmptyContent.into();
        assert!(matches!(err, AppError::Generation(_)));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error processing request:"));
    }
}
