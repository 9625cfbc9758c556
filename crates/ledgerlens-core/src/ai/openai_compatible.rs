//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API.
//! The default target is OpenRouter (https://openrouter.ai/api/v1), which
//! additionally reads the `HTTP-Referer` and `X-Title` headers to identify
//! the calling application.
//!
//! # Configuration
//!
//! See [`crate::config::AIConfig`]. The credential comes from
//! `OPENROUTER_API_KEY`, falling back to `OPENAI_API_KEY`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AIConfig;
use crate::error::{Error, Result};

use super::parsing::preview;
use super::types::{ChatMessage, ChatRequest};
use super::AIBackend;

/// OpenAI-compatible backend
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its pool.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    site_url: String,
    app_name: String,
}

impl OpenAICompatibleBackend {
    /// Create a new backend without credentials
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            site_url: crate::config::DEFAULT_SITE_URL.to_string(),
            app_name: crate::config::DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Create from a resolved configuration
    pub fn from_config(config: &AIConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            site_url: config.site_url.clone(),
            app_name: config.app_name.clone(),
        })
    }

    /// Map a non-success status into the typed error the fallback policy expects
    fn status_error(status: StatusCode, body: &str) -> Error {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Error::RateLimited;
        }
        Error::Unavailable(format!("chat API error {}: {}", status, preview(body)))
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_name)
            .json(&body);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        // No choice, null content and blank content all count as absent
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::EmptyResponse)?;

        debug!(model = %self.model, "chat completion response: {}", content);
        Ok(content)
    }

    async fn health_check(&self) -> bool {
        let mut req_builder = self.http_client.get(format!("{}/models", self.base_url));
        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        match req_builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::Role;
    use crate::test_utils::MockChatServer;

    fn request() -> ChatRequest {
        ChatRequest::new(
            vec![
                ChatMessage::system("You categorize expenses."),
                ChatMessage::user("Categorize this expense: \"Lunch\""),
            ],
            0.1,
            20,
        )
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OpenAICompatibleBackend::new("https://openrouter.ai/api/v1/", "m");
        assert_eq!(backend.host(), "https://openrouter.ai/api/v1");
        assert!(backend.api_key.is_none());
    }

    #[test]
    fn test_backend_with_api_key() {
        let backend =
            OpenAICompatibleBackend::with_api_key("http://localhost:1", "gpt-4", "sk-test123");
        assert_eq!(backend.model(), "gpt-4");
        assert_eq!(backend.api_key, Some("sk-test123".to_string()));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            OpenAICompatibleBackend::status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            Error::RateLimited
        ));
        match OpenAICompatibleBackend::status_error(StatusCode::UNAUTHORIZED, "bad key") {
            Error::Unavailable(msg) => assert!(msg.contains("bad key")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_error_truncates_long_body() {
        let body = "x".repeat(1000);
        match OpenAICompatibleBackend::status_error(StatusCode::BAD_GATEWAY, &body) {
            Error::Unavailable(msg) => assert!(msg.len() < 300),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_request_serialization() {
        let req = request();
        let body = ChatCompletionRequest {
            model: "deepseek/deepseek-chat-v3-0324:free",
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream: false,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "deepseek/deepseek-chat-v3-0324:free");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 20);
        let temp = json["temperature"].as_f64().unwrap();
        assert!((temp - 0.1).abs() < 0.001);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_deserialization_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_chat_against_mock_server() {
        let server = MockChatServer::replying("Food").await;
        let backend = OpenAICompatibleBackend::with_api_key(&server.url(), "test-model", "sk-1");

        let reply = backend.chat(&request()).await.unwrap();
        assert_eq!(reply, "Food");

        let seen = server.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "test-model");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sk-1"));
        assert_eq!(seen[0].title.as_deref(), Some("LedgerLens"));
        assert!(seen[0].referer.is_some());
        assert_eq!(seen[0].messages[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_chat_rate_limited() {
        let server = MockChatServer::with_status(429).await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");

        let err = backend.chat(&request()).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_chat_server_error_is_unavailable() {
        let server = MockChatServer::with_status(503).await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");

        let err = backend.chat(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_chat_empty_choices_is_empty_response() {
        let server = MockChatServer::without_choices().await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");

        let err = backend.chat(&request()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
    }

    #[tokio::test]
    async fn test_chat_blank_content_is_empty_response() {
        let server = MockChatServer::replying("  \n ").await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");

        let err = backend.chat(&request()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockChatServer::replying("ok").await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = OpenAICompatibleBackend::new("http://127.0.0.1:9", "test-model");
        assert!(!backend.health_check().await);
    }
}
