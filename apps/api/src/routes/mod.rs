pub mod health;
pub mod index;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingest::handlers::handle_upload_cv;
use crate::interview::handlers::handle_process_audio;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(index::index_handler))
        .route("/health", get(health::health_handler))
        .route("/upload_cv", post(handle_upload_cv))
        .route("/process_audio", post(handle_process_audio))
        .layer(body_limit)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum_extra::extract::cookie::Key;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::interview::composer::AnswerGenerator;
    use crate::llm_client::LlmError;
    use crate::session::MemorySessionStore;
    use crate::speech::recording::Recording;
    use crate::speech::{SpeechRecognizer, TranscriptionError};

    const BOUNDARY: &str = "----interview-test-boundary";
    const RESUME: &str = "Experienced backend engineer, 5 years Go.";
    const QUESTION: &str = "Tell me about your backend experience.";

    enum MockSpeech {
        Transcript(&'static str),
        Unintelligible,
        Fail(&'static str),
    }

    #[async_trait]
    impl SpeechRecognizer for MockSpeech {
        async fn recognize(&self, _recording: &Recording) -> Result<String, TranscriptionError> {
            match self {
                MockSpeech::Transcript(t) => Ok(t.to_string()),
                MockSpeech::Unintelligible => Err(TranscriptionError::Unintelligible),
                MockSpeech::Fail(detail) => Err(TranscriptionError::Request(detail.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct MockGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for MockGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("In my five years writing Go I owned the payments backend.".to_string())
        }
    }

    struct TestApp {
        router: Router,
        generator: Arc<MockGenerator>,
        _upload_dir: tempfile::TempDir,
    }

    impl TestApp {
        fn new(speech: MockSpeech) -> Self {
            let upload_dir = tempfile::tempdir().unwrap();
            let vars: HashMap<&str, String> = HashMap::from([
                ("GEMINI_API_KEY", "test-key".to_string()),
                ("UPLOAD_DIR", upload_dir.path().display().to_string()),
            ]);
            let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
            let generator = Arc::new(MockGenerator::default());

            let state = AppState {
                cookie_key: Key::derive_from(config.secret_key.as_bytes()),
                config,
                sessions: Arc::new(MemorySessionStore::new(chrono::Duration::minutes(30))),
                recognizer: Arc::new(speech),
                generator: generator.clone(),
            };

            Self {
                router: build_router(state),
                generator,
                _upload_dir: upload_dir,
            }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn post_file(
            &self,
            path: &str,
            field: &str,
            filename: &str,
            data: &[u8],
            cookie: Option<&str>,
        ) -> Response {
            let mut request = Request::post(path).header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            let body = multipart_body(field, Some(filename), data);
            self.send(request.body(Body::from(body)).unwrap()).await
        }

        fn prompts(&self) -> Vec<String> {
            self.generator.prompts.lock().unwrap().clone()
        }
    }

    fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
        let disposition = match filename {
            Some(f) => format!("form-data; name=\"{field}\"; filename=\"{f}\""),
            None => format!("form-data; name=\"{field}\""),
        };
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn wav_clip() -> Vec<u8> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..1600i16 {
                writer.write_sample((i % 64) * 100).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn session_cookie(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie should be set")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .send(Request::get("/").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .send(Request::get("/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_and_answer_end_to_end() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));

        let response = app
            .post_file("/upload_cv", "cv", "resume.txt", RESUME.as_bytes(), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "CV uploaded successfully", "filename": "resume.txt" })
        );

        let response = app
            .post_file("/process_audio", "audio", "question.wav", &wav_clip(), Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["question"], QUESTION);
        assert!(!body["answer"].as_str().unwrap().is_empty());

        let prompts = app.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(RESUME));
        assert!(prompts[0].contains(QUESTION));
    }

    #[tokio::test]
    async fn test_answer_before_upload_uses_empty_cv() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/process_audio", "audio", "q.wav", &wav_clip(), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.prompts()[0].contains("CV Content: \n"));
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_cv() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/upload_cv", "cv", "resume.txt", RESUME.as_bytes(), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        // no cookie: a different client
        let response = app
            .post_file("/process_audio", "audio", "q.wav", &wav_clip(), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!app.prompts()[0].contains(RESUME));
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_cv() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/upload_cv", "cv", "old.txt", b"Old resume text", None)
            .await;
        let cookie = session_cookie(&response);
        app.post_file("/upload_cv", "cv", "new.txt", b"New resume text", Some(&cookie))
            .await;

        app.post_file("/process_audio", "audio", "q.wav", &wav_clip(), Some(&cookie))
            .await;
        let prompt = &app.prompts()[0];
        assert!(prompt.contains("New resume text"));
        assert!(!prompt.contains("Old resume text"));
    }

    #[tokio::test]
    async fn test_upload_without_cv_part_is_rejected() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/upload_cv", "document", "resume.txt", RESUME.as_bytes(), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "No file uploaded" }));
    }

    #[tokio::test]
    async fn test_upload_with_empty_filename_is_rejected() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/upload_cv", "cv", "", RESUME.as_bytes(), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "No file selected" }));
    }

    #[tokio::test]
    async fn test_invalid_extension_rejected_and_session_untouched() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/upload_cv", "cv", "resume.txt", RESUME.as_bytes(), None)
            .await;
        let cookie = session_cookie(&response);

        let response = app
            .post_file("/upload_cv", "cv", "payload.exe", b"MZ\x90\x00", Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "Invalid file type" }));

        app.post_file("/process_audio", "audio", "q.wav", &wav_clip(), Some(&cookie))
            .await;
        assert!(app.prompts()[0].contains(RESUME));
    }

    #[tokio::test]
    async fn test_upload_filename_is_sanitized() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/upload_cv", "cv", "../../My Resume.TXT", RESUME.as_bytes(), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["filename"], "My_Resume.TXT");
    }

    #[tokio::test]
    async fn test_missing_audio_part_is_rejected() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/process_audio", "cv", "q.wav", &wav_clip(), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "No audio file uploaded" }));
    }

    #[tokio::test]
    async fn test_audio_with_empty_filename_is_rejected() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/process_audio", "audio", "", &wav_clip(), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "No audio file selected" }));
        assert!(app.prompts().is_empty());
    }

    #[cfg(feature = "docx")]
    fn docx_resume(paragraphs: &[&str]) -> Vec<u8> {
        use std::io::Write;

        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::FileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[cfg(feature = "docx")]
    #[tokio::test]
    async fn test_docx_upload_feeds_answer_prompt() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let docx = docx_resume(&["Jane Doe", "Staff engineer, payments"]);
        let response = app
            .post_file("/upload_cv", "cv", "Jane CV.docx", &docx, None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert_eq!(json_body(response).await["filename"], "Jane_CV.docx");

        let response = app
            .post_file("/process_audio", "audio", "q.wav", &wav_clip(), Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.prompts()[0].contains("Jane Doe\nStaff engineer, payments\n"));
    }

    #[tokio::test]
    async fn test_unintelligible_audio_skips_generation() {
        let app = TestApp::new(MockSpeech::Unintelligible);
        let response = app
            .post_file("/process_audio", "audio", "q.wav", &wav_clip(), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Could not understand audio" })
        );
        assert!(app.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_speech_provider_failure_reports_detail() {
        let app = TestApp::new(MockSpeech::Fail("recognition connection failed: timed out"));
        let response = app
            .post_file("/process_audio", "audio", "q.wav", &wav_clip(), None)
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("recognition connection failed: timed out"));
        assert!(app.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_non_wav_audio_is_server_error() {
        let app = TestApp::new(MockSpeech::Transcript(QUESTION));
        let response = app
            .post_file("/process_audio", "audio", "q.wav", b"not audio at all", None)
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(app.prompts().is_empty());
    }
}
