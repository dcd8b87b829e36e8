// Answer composition: transcript + session résumé text → prompt → generated answer.
// All provider calls go through llm_client.

pub mod composer;
pub mod handlers;
pub mod prompts;
