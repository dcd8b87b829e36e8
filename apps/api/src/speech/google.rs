use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::recording::Recording;
use super::{SpeechRecognizer, TranscriptionError};

const GOOGLE_SPEECH_URL: &str = "https://www.google.com/speech-api/v2/recognize";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Recognizer backed by the Google Speech API v2 endpoint.
///
/// The recording is posted as raw `audio/l16` PCM; the reply is a stream of
/// newline-separated JSON objects, most of them empty.
pub struct GoogleSpeechRecognizer {
    client: Client,
    api_key: String,
    language: String,
    url: String,
}

impl GoogleSpeechRecognizer {
    pub fn new(api_key: String, language: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            language,
            url: GOOGLE_SPEECH_URL.to_string(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(&self, recording: &Recording) -> Result<String, TranscriptionError> {
        let content_type = format!("audio/l16; rate={};", recording.sample_rate);

        tracing::debug!(
            language = %self.language,
            samples = recording.samples.len(),
            "Sending audio to Google speech API"
        );

        let response = self
            .client
            .post(&self.url)
            .query(&[
                ("client", "chromium"),
                ("lang", self.language.as_str()),
                ("key", self.api_key.as_str()),
                ("pFilter", "0"),
            ])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(recording.to_l16_be())
            .send()
            .await
            .map_err(|e| TranscriptionError::Request(format!("recognition connection failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::Request(format!("recognition body: {e}")))?;

        if !status.is_success() {
            return Err(TranscriptionError::Request(format!(
                "recognition request failed: status {status}: {body}"
            )));
        }

        parse_recognition_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RecognitionChunk {
    #[serde(default)]
    result: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternative: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: Option<String>,
}

/// Picks the first alternative of the first non-empty result.
fn parse_recognition_response(body: &str) -> Result<String, TranscriptionError> {
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let chunk: RecognitionChunk = serde_json::from_str(line).map_err(|e| {
            TranscriptionError::Request(format!("malformed recognition response: {e}"))
        })?;

        let Some(result) = chunk.result.into_iter().next() else {
            continue;
        };

        return result
            .alternative
            .into_iter()
            .next()
            .and_then(|alt| alt.transcript)
            .ok_or(TranscriptionError::Unintelligible);
    }

    Err(TranscriptionError::Unintelligible)
}
