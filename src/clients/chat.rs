//! Chat-completion wire types shared by the research and generation clients.

use serde::{Deserialize, Serialize};

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Perplexity-only: restrict web search to recent results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<String>,
}

impl ChatRequest {
    /// A request carrying a single user message
    pub fn single(model: impl Into<String>, content: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
            temperature,
            max_tokens: None,
            search_recency_filter: None,
        }
    }
}

/// Response body of a chat completion. Only the fields we read are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    /// Perplexity returns the sources it used here
    #[serde(default)]
    pub citations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of `choices[0].message.content`, if present
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}
