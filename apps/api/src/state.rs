use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::Config;
use crate::interview::composer::AnswerGenerator;
use crate::session::SessionStore;
use crate::speech::SpeechRecognizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    /// Speech-to-text backend. Default: GoogleSpeechRecognizer.
    pub recognizer: Arc<dyn SpeechRecognizer>,
    /// Text-generation backend. Default: LlmClient (Gemini).
    pub generator: Arc<dyn AnswerGenerator>,
    /// Signs the session cookie; derived from `SECRET_KEY`.
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
