// Prompt template for interview answers.

/// Builds the single-shot answer prompt.
///
/// Both values are embedded verbatim; an empty `cv_content` is valid and
/// simply leaves the CV section blank.
pub fn build_answer_prompt(cv_content: &str, question: &str) -> String {
    format!(
        "You are an AI interview assistant. Based on the following CV content and the interview question, \
provide a concise, relevant answer that showcases the candidate's experience and skills.

CV Content: {cv_content}

Interview Question: {question}

Please provide a professional answer that:
1. Directly addresses the question
2. Uses specific examples from the CV when relevant
3. Is concise and interview-appropriate
4. Demonstrates the candidate's strengths
"
    )
}
