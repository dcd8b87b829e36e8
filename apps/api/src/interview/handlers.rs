use axum::{
    extract::{Multipart, State},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::composer::compose_answer;
use crate::session::{resolve_session, CV_CONTENT};
use crate::speech::transcribe_upload;
use crate::state::AppState;
use crate::upload::take_file_field;

/// One question/answer pair. Returned directly, never stored.
#[derive(Debug, Serialize)]
pub struct InterviewExchange {
    pub question: String,
    pub answer: String,
}

/// POST /process_audio
///
/// Transcribes the `audio` file part and answers it using the résumé text in
/// the caller's session (empty if nothing was uploaded yet).
pub async fn handle_process_audio(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Result<(SignedCookieJar, Json<InterviewExchange>), AppError> {
    let upload = take_file_field(&mut multipart, "audio")
        .await?
        .ok_or_else(|| AppError::Validation("No audio file uploaded".to_string()))?;

    if upload.filename.is_empty() {
        return Err(AppError::Validation("No audio file selected".to_string()));
    }

    let (session, jar) = resolve_session(jar);

    let question = transcribe_upload(state.recognizer.as_ref(), upload.data).await?;

    let cv_content = state
        .sessions
        .get(session, CV_CONTENT)
        .await
        .unwrap_or_default();

    let answer = compose_answer(state.generator.as_ref(), &question, &cv_content).await?;
    info!(session = %session, "Interview question answered");

    Ok((jar, Json(InterviewExchange { question, answer })))
}
