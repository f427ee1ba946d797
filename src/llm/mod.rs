// OpenRouter chat-completion client module
// Author: kelexine (https://github.com/kelexine)

mod client;

pub use client::OpenRouterClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
}

/// Response body from `POST /chat/completions`; only the fields we read.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the payload carries one.
    pub fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
    }
}

/// Anything that can turn a message list into completion text.
///
/// The translation and answering services only see this trait so tests can
/// substitute a scripted backend for the network.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion. No retries; the first failure is returned.
    async fn complete(&self, messages: Vec<ChatMessage>, timeout: Duration) -> Result<String>;

    /// Whether a credential is available for remote calls.
    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_format() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "meta-llama/llama-3.2-3b-instruct:free",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "meta-llama/llama-3.2-3b-instruct:free");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_first_content() {
        let resp: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"سلام"}},{"message":{"content":"x"}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.first_content().as_deref(), Some("سلام"));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.first_content().is_none());

        let no_content: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(no_content.first_content().is_none());
    }
}
