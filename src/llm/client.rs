// OpenRouter API client
// Author: kelexine (https://github.com/kelexine)

use super::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionBackend};
use crate::config::OpenRouterConfig;
use crate::error::{Result, ServiceError};
use crate::utils::logging::sanitize;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Client for the OpenRouter chat-completion API.
///
/// Built once at startup. Every call is a single POST with a per-call
/// timeout; failures are returned to the caller immediately.
pub struct OpenRouterClient {
    http_client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    /// Configure the HTTP client. Does not contact the API.
    pub fn new(config: &OpenRouterConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| ServiceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created OpenRouter HTTP client for {}", config.base_url);

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Get the configured model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the API base_url
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }

    /// Extract error message from an OpenRouter error body
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
        }

        serde_json::from_str::<ErrorResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .and_then(|e| e.message)
    }

    async fn post_completion(&self, messages: &[ChatMessage], timeout: Duration) -> Result<String> {
        let api_key = self.api_key().ok_or_else(|| {
            ServiceError::ConfigurationMissing("OpenRouter API key not configured".to_string())
        })?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
        };

        debug!(
            "Calling chat completion: model={}, messages={}",
            self.config.model,
            messages.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("HTTP error: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let error_msg = Self::extract_error_message(&response_text)
                .unwrap_or_else(|| response_text.clone());
            error!(
                "OpenRouter API error: HTTP {} - {}",
                status,
                sanitize(&error_msg)
            );
            return Err(ServiceError::RemoteUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_msg
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                error!("Failed to parse OpenRouter response: {}", e);
                ServiceError::RemoteUnavailable(format!("Response parsing error: {}", e))
            })?;

        completion.first_content().ok_or_else(|| {
            ServiceError::RemoteUnavailable("Response has no completion content".to_string())
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, messages: Vec<ChatMessage>, timeout: Duration) -> Result<String> {
        let start = Instant::now();
        let result = self.post_completion(&messages, timeout).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(ServiceError::ConfigurationMissing(_)) => "unconfigured",
            Err(_) => "failure",
        };
        crate::metrics::record_llm_call(outcome, start.elapsed().as_secs_f64());

        result
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &mockito::ServerGuard, api_key: Option<&str>) -> OpenRouterConfig {
        OpenRouterConfig {
            api_key: api_key.map(str::to_string),
            base_url: server.url(),
            ..OpenRouterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_success_sends_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-or-test")
            .match_header("http-referer", "https://physical-ai-textbook.com")
            .match_header("x-title", "Physical AI Textbook")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "meta-llama/llama-3.2-3b-instruct:free",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  hi there \n"}}]}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new(&config_for(&server, Some("sk-or-test"))).unwrap();
        let text = client
            .complete(vec![ChatMessage::user("hello")], Duration::from_secs(5))
            .await
            .unwrap();

        // Trimming is the caller's decision
        assert_eq!(text, "  hi there \n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit exceeded"}}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new(&config_for(&server, Some("sk-or-test"))).unwrap();
        let err = client
            .complete(vec![ChatMessage::user("hello")], Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            ServiceError::RemoteUnavailable(msg) => assert!(msg.contains("Rate limit exceeded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_is_remote_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new(&config_for(&server, Some("sk-or-test"))).unwrap();
        let err = client
            .complete(vec![ChatMessage::user("hello")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = OpenRouterClient::new(&config_for(&server, None)).unwrap();
        assert!(!client.is_configured());

        let err = client
            .complete(vec![ChatMessage::user("hello")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ConfigurationMissing(_)));
        mock.assert_async().await;
    }
}
