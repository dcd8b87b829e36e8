use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::llm_client;

/// Placeholder signing key used when `SECRET_KEY` is unset. Sessions signed with
/// it are forgeable by anyone who has read this file.
pub const INSECURE_SECRET_KEY: &str = "insecure-development-secret-key-change-me-please";

/// Minimum key length accepted for cookie key derivation.
const MIN_SECRET_KEY_BYTES: usize = 32;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub secret_key: String,
    /// True when `secret_key` is the built-in placeholder.
    pub secret_key_is_default: bool,
    pub speech_api_key: String,
    pub speech_language: String,
    pub upload_dir: PathBuf,
    pub session_ttl_minutes: i64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = require(&lookup, "GEMINI_API_KEY")?;

        let (secret_key, secret_key_is_default) = match lookup("SECRET_KEY") {
            Some(key) => (key, false),
            None => (INSECURE_SECRET_KEY.to_string(), true),
        };
        if secret_key.len() < MIN_SECRET_KEY_BYTES {
            bail!("SECRET_KEY must be at least {MIN_SECRET_KEY_BYTES} bytes long");
        }

        Ok(Config {
            speech_api_key: lookup("SPEECH_API_KEY").unwrap_or_else(|| gemini_api_key.clone()),
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL")
                .unwrap_or_else(|| llm_client::DEFAULT_MODEL.to_string()),
            secret_key,
            secret_key_is_default,
            speech_language: lookup("SPEECH_LANGUAGE").unwrap_or_else(|| "en-US".to_string()),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("interview-uploads")),
            session_ttl_minutes: parse_or(&lookup, "SESSION_TTL_MINUTES", 24 * 60)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
