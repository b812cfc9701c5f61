//! Perplexity research provider implementation.

use async_trait::async_trait;
use tracing::debug;

use crate::clients::{
    body_snippet, endpoint_url, ChatRequest, ChatResponse, ClientError, ResearchProvider,
};
use crate::config::{Config, ResearchConfig};
use crate::models::ResearchAnswer;
use crate::utils::HttpClient;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Perplexity research provider
///
/// Uses the online chat-completions API, which answers from a live web search
/// and returns the URLs it cited alongside the answer.
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    http: HttpClient,
    api_key: String,
    settings: ResearchConfig,
}

impl PerplexityClient {
    /// Create a client with explicit settings
    pub fn new(http: HttpClient, api_key: impl Into<String>, settings: ResearchConfig) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            settings,
        }
    }

    /// Create a client from application configuration.
    ///
    /// Fails with [`ClientError::Configuration`] when no Perplexity key is set.
    pub fn from_config(http: HttpClient, config: &Config) -> Result<Self, ClientError> {
        let api_key = config.api_keys.perplexity.clone().ok_or_else(|| {
            ClientError::Configuration(
                "Perplexity API key is not set (PERPLEXITY_API_KEY)".to_string(),
            )
        })?;

        Ok(Self::new(http, api_key, config.research.clone()))
    }

    fn build_request(&self, question: &str) -> ChatRequest {
        let mut request = ChatRequest::single(
            self.settings.model.as_str(),
            question,
            self.settings.temperature,
        );
        request.search_recency_filter = Some(self.settings.search_recency_filter.clone());
        request
    }
}

#[async_trait]
impl ResearchProvider for PerplexityClient {
    fn name(&self) -> &str {
        "Perplexity"
    }

    async fn research(&self, question: &str) -> Result<ResearchAnswer, ClientError> {
        let url = endpoint_url(&self.settings.base_url, CHAT_COMPLETIONS_PATH);
        debug!(model = %self.settings.model, "Sending research request");

        let response = self
            .http
            .client()
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(question))
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to reach Perplexity: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!(
                "Perplexity API returned status {}: {}",
                status,
                body_snippet(&body)
            )));
        }

        let data: ChatResponse = response.json().await.map_err(|e| {
            ClientError::MalformedResponse(format!("Failed to parse Perplexity response: {}", e))
        })?;

        let answer = data.first_content().ok_or_else(|| {
            ClientError::MalformedResponse(
                "Perplexity response has no choices[0].message.content".to_string(),
            )
        })?;

        debug!(
            status = %status,
            citations = data.citations.as_ref().map_or(0, Vec::len),
            "Research response received"
        );

        Ok(ResearchAnswer::new(
            question,
            answer,
            data.citations.clone().unwrap_or_default(),
        ))
    }
}
