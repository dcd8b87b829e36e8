mod config;
mod errors;
mod ingest;
mod interview;
mod llm_client;
mod routes;
mod session;
mod speech;
mod state;
mod upload;

use anyhow::Result;
use axum_extra::extract::cookie::Key;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::{sweep_expired, MemorySessionStore};
use crate::speech::google::GoogleSpeechRecognizer;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    if config.secret_key_is_default {
        warn!("SECRET_KEY is not set; session cookies are signed with an insecure placeholder key");
    }

    // Initialize provider clients
    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    let recognizer = GoogleSpeechRecognizer::new(
        config.speech_api_key.clone(),
        config.speech_language.clone(),
    )?;
    info!(
        "Speech recognizer initialized (language: {})",
        config.speech_language
    );

    // Session store with a background sweep of idle sessions
    let sessions = Arc::new(MemorySessionStore::new(chrono::Duration::minutes(
        config.session_ttl_minutes,
    )));
    tokio::spawn(sweep_expired(sessions.clone(), SESSION_SWEEP_INTERVAL));

    info!("Document scratch directory: {}", config.upload_dir.display());

    // Build app state
    let state = AppState {
        cookie_key: Key::derive_from(config.secret_key.as_bytes()),
        config: config.clone(),
        sessions,
        recognizer: Arc::new(recognizer),
        generator: Arc::new(llm),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
