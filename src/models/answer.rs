//! Answer model returned by a research provider for a single question.

use serde::{Deserialize, Serialize};

/// A researched answer to one question, with the sources the provider cited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchAnswer {
    /// The question exactly as it was sent to the provider
    pub question: String,

    /// The provider's answer text
    pub answer: String,

    /// Citation URLs in provider order (may be empty)
    #[serde(default)]
    pub citations: Vec<String>,
}

impl ResearchAnswer {
    /// Create a new answer
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        citations: Vec<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            citations,
        }
    }

    /// Render this answer as one block of the combined transcript.
    pub fn render(&self) -> String {
        format!(
            "Related Question: {}\nResearch: {}\nCitations: {}",
            self.question,
            self.answer,
            self.citations.join(", ")
        )
    }
}
