//! External service clients used to resolve and expand questions.
//!
//! Two seams are defined here:
//!
//! - [`ResearchProvider`]: answers a natural-language question, returning the
//!   answer text together with any citations.
//! - [`QuestionGenerator`]: reads an answer and proposes follow-up questions.
//!
//! The production implementations ([`PerplexityClient`] and
//! [`OpenAiQuestionGenerator`]) both talk to OpenAI-compatible
//! chat-completion endpoints. In-memory doubles live in [`crate::mock`].
//!
//! Neither client retries. A failed call is returned to the caller as a
//! [`ClientError`] and retry policy, if any, belongs there.

mod chat;
mod openai;
mod perplexity;

pub use chat::{ChatMessage, ChatRequest, ChatResponse};
pub use openai::{related_questions_prompt, OpenAiQuestionGenerator};
pub use perplexity::PerplexityClient;

use async_trait::async_trait;

use crate::models::ResearchAnswer;

/// Answers a single question.
#[async_trait]
pub trait ResearchProvider: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Research `question`, issuing exactly one request to the provider
    async fn research(&self, question: &str) -> Result<ResearchAnswer, ClientError>;
}

/// Proposes follow-up questions for an answer.
///
/// Callers must tolerate any number of results, including none.
#[async_trait]
pub trait QuestionGenerator: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this generator
    fn name(&self) -> &str;

    /// Generate follow-up questions for `source_answer`, in the order proposed
    async fn generate(&self, source_answer: &str) -> Result<Vec<String>, ClientError>;
}

/// Errors that can occur when calling an external service
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network failure or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered but the body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Missing or invalid client configuration, such as an absent API key
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Join a base URL and an endpoint path without doubling the slash.
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Truncate a response body for inclusion in an error message.
pub(crate) fn body_snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() > MAX_CHARS {
        let cut: String = body.chars().take(MAX_CHARS).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}
