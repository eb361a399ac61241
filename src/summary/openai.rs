//! OpenAI-compatible chat completions adapter

use crate::config::SummaryConfig;
use crate::summary::{AdapterError, LlmAdapter};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiAdapter {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAiAdapter {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Rebuilds the HTTP client so every request is bounded by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AdapterError> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Builds an adapter whose HTTP client enforces the configured timeout
    pub fn from_config(config: &SummaryConfig, api_key: &str) -> Result<Self, AdapterError> {
        Self::new(api_key, &config.model)
            .with_base_url(&config.api_base_url)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, AdapterError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| AdapterError::Auth("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn request_error(&self, e: reqwest::Error) -> AdapterError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => AdapterError::Timeout(timeout.as_secs()),
            _ => AdapterError::from(e),
        }
    }
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    async fn summarize_batch(&self, system: &str, user: &str) -> Result<String, AdapterError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        debug!(model = %self.model, "Chat completion request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(AdapterError::Auth(format!("{}: {}", status, message)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        let chat: ChatResponse = serde_json::from_str(&body)?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AdapterError::Malformed("response carried no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> OpenAiAdapter {
        OpenAiAdapter::new("test-key", "gpt-4").with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "title one\ntitle two"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "1. Uno (News) - motivo"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = adapter(&server)
            .summarize_batch("be brief", "title one\ntitle two")
            .await
            .unwrap();
        assert_eq!(reply, "1. Uno (News) - motivo");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = adapter(&server).summarize_batch("s", "u").await.unwrap_err();
        assert!(matches!(err, AdapterError::Auth(_)));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = adapter(&server).summarize_batch("s", "u").await.unwrap_err();
        match err {
            AdapterError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = adapter(&server).summarize_batch("s", "u").await.unwrap_err();
        assert!(matches!(err, AdapterError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = adapter(&server).summarize_batch("s", "u").await.unwrap_err();
        assert!(matches!(err, AdapterError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_client_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let adapter = adapter(&server).with_timeout(Duration::from_secs(1)).unwrap();
        let err = adapter.summarize_batch("s", "u").await.unwrap_err();
        assert!(matches!(err, AdapterError::Timeout(1)));
    }

    #[test]
    fn test_from_config_uses_configured_endpoint() {
        let config = SummaryConfig {
            api_base_url: "http://localhost:9000/v1/".to_string(),
            ..SummaryConfig::default()
        };
        let adapter = OpenAiAdapter::from_config(&config, "k").unwrap();
        assert_eq!(adapter.base_url, "http://localhost:9000/v1");
        assert_eq!(adapter.timeout, Some(Duration::from_secs(config.timeout_secs)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let adapter = OpenAiAdapter::new("k", "gpt-4").with_base_url("http://127.0.0.1:1");
        let err = adapter.summarize_batch("s", "u").await.unwrap_err();
        assert!(matches!(err, AdapterError::Network(_)));
    }
}
