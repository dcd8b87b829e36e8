//! Answer Composer: turns a transcribed question and résumé text into an answer.

use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::interview::prompts::build_answer_prompt;
use crate::llm_client::{LlmClient, LlmError};

/// Text-generation backend. Carried in `AppState` as `Arc<dyn AnswerGenerator>`
/// so handlers never depend on a concrete provider.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl AnswerGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        LlmClient::generate(self, prompt).await
    }
}

/// Builds the prompt and returns the provider's text verbatim.
pub async fn compose_answer(
    generator: &dyn AnswerGenerator,
    question: &str,
    cv_content: &str,
) -> Result<String, AppError> {
    let prompt = build_answer_prompt(cv_content, question);
    let answer = generator.generate(&prompt).await?;
    info!(
        prompt_chars = prompt.len(),
        answer_chars = answer.len(),
        "Answer generated"
    );
    Ok(answer)
}
