//! OpenAI follow-up question generator.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::{
    body_snippet, endpoint_url, ChatRequest, ChatResponse, ClientError, QuestionGenerator,
};
use crate::config::{Config, GenerationConfig};
use crate::utils::HttpClient;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Build the instruction prompt asking for follow-up questions about `answer`.
pub fn related_questions_prompt(answer: &str) -> String {
    format!(
        "Generate Related Questions\n\n\
         **Instructions:**\n\
         Analyze the following user provided output and generate 5 related questions that delve into its key \
         concepts, methodologies, comparisons with other approaches, implementation challenges, and potential improvements. \
         The questions should aim to deepen understanding, explore efficiencies, identify possible enhancements, and consider \
         practical applications. Response must be one line per question, no numbering or formatting.\n\n\
         User Provided Output: {}",
        answer
    )
}

/// Split a completion into one question per non-blank line.
fn parse_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generates follow-up questions with an OpenAI chat model
#[derive(Debug, Clone)]
pub struct OpenAiQuestionGenerator {
    http: HttpClient,
    api_key: String,
    settings: GenerationConfig,
}

impl OpenAiQuestionGenerator {
    /// Create a generator with explicit settings
    pub fn new(http: HttpClient, api_key: impl Into<String>, settings: GenerationConfig) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            settings,
        }
    }

    /// Create a generator from application configuration.
    ///
    /// Fails with [`ClientError::Configuration`] when no OpenAI key is set.
    pub fn from_config(http: HttpClient, config: &Config) -> Result<Self, ClientError> {
        let api_key = config.api_keys.openai.clone().ok_or_else(|| {
            ClientError::Configuration("OpenAI API key is not set (OPENAI_API_KEY)".to_string())
        })?;

        Ok(Self::new(http, api_key, config.generation.clone()))
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn generate(&self, source_answer: &str) -> Result<Vec<String>, ClientError> {
        let url = endpoint_url(&self.settings.base_url, CHAT_COMPLETIONS_PATH);

        let mut request = ChatRequest::single(
            self.settings.model.as_str(),
            related_questions_prompt(source_answer),
            self.settings.temperature,
        );
        request.max_tokens = Some(self.settings.max_tokens);

        debug!(model = %self.settings.model, "Requesting related questions");

        let response = self
            .http
            .client()
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to reach OpenAI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!(
                "OpenAI API returned status {}: {}",
                status,
                body_snippet(&body)
            )));
        }

        debug!(status = %status, "Related questions response received");

        let data: ChatResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Unparsable related-questions reply, using no questions");
                return Ok(Vec::new());
            }
        };

        match data.first_content() {
            Some(content) => Ok(parse_questions(content)),
            None => {
                warn!("Related-questions reply has no content, using no questions");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn generator_for(server: &mockito::Server) -> OpenAiQuestionGenerator {
        let settings = GenerationConfig {
            base_url: server.url(),
            ..GenerationConfig::default()
        };
        OpenAiQuestionGenerator::new(HttpClient::new().unwrap(), "sk-test", settings)
    }

    fn completion(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    #[test]
    fn test_prompt_embeds_answer() {
        let prompt = related_questions_prompt("Tokens get FP8.");
        assert!(prompt.starts_with("Generate Related Questions\n\n**Instructions:**\n"));
        assert!(prompt.contains("generate 5 related questions"));
        assert!(prompt.contains("no numbering or formatting."));
        assert!(prompt.ends_with("User Provided Output: Tokens get FP8."));
    }

    #[test]
    fn test_parse_questions_trims_and_drops_blanks() {
        let parsed = parse_questions("  What is A?  \n\n\tHow does B work?\n   \nWhy C?\n");
        assert_eq!(parsed, vec!["What is A?", "How does B work?", "Why C?"]);
    }

    #[test]
    fn test_parse_questions_handles_crlf() {
        let parsed = parse_questions("One?\r\nTwo?\r\n");
        assert_eq!(parsed, vec!["One?", "Two?"]);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "max_tokens": 5000
            })))
            .with_status(200)
            .with_body(completion("Q1?\nQ2?\n\nQ3?"))
            .create_async()
            .await;

        let questions = generator_for(&server).generate("some answer").await.unwrap();

        mock.assert_async().await;
        assert_eq!(questions, vec!["Q1?", "Q2?", "Q3?"]);
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_with_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("User Provided Output: the answer".to_string()))
            .with_status(200)
            .with_body(completion("Q?"))
            .create_async()
            .await;

        generator_for(&server).generate("the answer").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_empty_reply_yields_no_questions() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion("   \n  "))
            .create_async()
            .await;

        let questions = generator_for(&server).generate("answer").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_unparsable_reply_yields_no_questions() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let questions = generator_for(&server).generate("answer").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_auth_failure_is_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(json!({"error": {"message": "bad key"}}).to_string())
            .create_async()
            .await;

        let err = generator_for(&server).generate("answer").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_generate_unreachable_names_service() {
        // Bind then release a port so nothing is listening on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let settings = GenerationConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            ..GenerationConfig::default()
        };
        let generator = OpenAiQuestionGenerator::new(HttpClient::new().unwrap(), "sk-test", settings);

        match generator.generate("answer").await.unwrap_err() {
            ClientError::Transport(msg) => assert!(msg.starts_with("Failed to reach OpenAI")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_name() {
        let generator =
            OpenAiQuestionGenerator::new(HttpClient::new().unwrap(), "sk-test", Default::default());
        assert_eq!(generator.name(), "OpenAI");
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = Config::default();
        config.api_keys.openai = None;

        let err =
            OpenAiQuestionGenerator::from_config(HttpClient::new().unwrap(), &config).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }
}
