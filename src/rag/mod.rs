//! Question answering over the textbook.
//!
//! Looks up context items in the vector store, then asks the completion
//! backend to answer (or to rewrite content for a skill level). Failures are
//! returned as structured payloads, never as faults.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod vector_store;

pub use vector_store::{ContextItem, QdrantClient, VectorStore};

use crate::error::{Result, ServiceError};
use crate::llm::{ChatMessage, CompletionBackend};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SELECTION_SOURCE: &str = "User Selection";

/// Payload for `ask` and `ask_selection`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub success: bool,
    pub answer: Option<String>,
    pub context: Vec<ContextItem>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalizeMeta {
    pub level: String,
}

/// Payload for `personalize`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalizeResult {
    pub success: bool,
    pub personalized_markdown: Option<String>,
    pub meta: PersonalizeMeta,
    pub error: Option<String>,
}

fn failure_message(err: &ServiceError) -> String {
    match err {
        ServiceError::ConfigurationMissing(_) => "API key not configured".to_string(),
        _ => "Answer unavailable. Please try again later.".to_string(),
    }
}

pub fn answer_system_prompt(background: &str) -> String {
    format!(
        "You are an expert AI assistant for a Physical AI & Humanoid Robotics textbook.\n\
         Use the provided context to answer the user's question.\n\
         If the answer is not in the context, use your general knowledge but mention that it's outside the textbook scope.\n\n\
         User Background: {background}\n\
         (Tailor your answer to this background. If they are 'Software', focus on code/algorithms. If 'Hardware', focus on electronics/actuators.)"
    )
}

pub fn answer_user_prompt(query: &str, context: &[ContextItem]) -> String {
    let context_str = context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Context:\n{context_str}\n\nQuestion: {query}")
}

const PERSONALIZE_SYSTEM_PROMPT: &str = "You are an expert at adapting educational content for different skill levels.

Level Definitions:
- Beginner: Simple language, more analogies, define technical terms.
- Intermediate: Standard technical textbook style.
- Expert: Concise, focus on advanced concepts, assume prior knowledge.";

pub struct RagService {
    backend: Arc<dyn CompletionBackend>,
    store: Option<Arc<dyn VectorStore>>,
    search_limit: usize,
    timeout: Duration,
}

impl RagService {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        store: Option<Arc<dyn VectorStore>>,
        search_limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            search_limit,
            timeout,
        }
    }

    /// Context for a question. Store failures degrade to an empty list.
    pub async fn search_context(&self, query: &str) -> Vec<ContextItem> {
        let Some(store) = &self.store else {
            debug!("No vector store configured; answering without context");
            return Vec::new();
        };

        match store.search_context(query, self.search_limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Context lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Answer a question from the stored textbook context.
    pub async fn ask(&self, query: &str, background: &str) -> AnswerResult {
        let context = self.search_context(query).await;
        self.answer_with(query, context, background).await
    }

    /// Answer a question about text the reader selected on the page.
    pub async fn ask_selection(&self, query: &str, selected_text: &str) -> AnswerResult {
        let context = vec![ContextItem::new(selected_text, SELECTION_SOURCE)];
        self.answer_with(query, context, "General").await
    }

    /// Rewrite textbook content for a reader level.
    pub async fn personalize(&self, text: &str, level: &str) -> PersonalizeResult {
        let messages = vec![
            ChatMessage::system(PERSONALIZE_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Rewrite the following textbook content for a {level} level audience.\n\nContent:\n{text}"
            )),
        ];

        let (success, personalized_markdown, error) = match self.complete(messages).await {
            Ok(text) => (true, Some(text), None),
            Err(e) => {
                warn!("Personalization failed: {}", e);
                (false, None, Some(failure_message(&e)))
            }
        };

        PersonalizeResult {
            success,
            personalized_markdown,
            meta: PersonalizeMeta {
                level: level.to_string(),
            },
            error,
        }
    }

    async fn answer_with(&self, query: &str, context: Vec<ContextItem>, background: &str) -> AnswerResult {
        let messages = vec![
            ChatMessage::system(answer_system_prompt(background)),
            ChatMessage::user(answer_user_prompt(query, &context)),
        ];

        match self.complete(messages).await {
            Ok(answer) => AnswerResult {
                success: true,
                answer: Some(answer),
                context,
                error: None,
            },
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                AnswerResult {
                    success: false,
                    answer: None,
                    context,
                    error: Some(failure_message(&e)),
                }
            }
        }
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        if !self.backend.is_configured() {
            return Err(ServiceError::ConfigurationMissing(
                "OpenRouter API key not configured".to_string(),
            ));
        }
        self.backend.complete(messages, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records the last message list and replies with a fixed answer.
    #[derive(Default)]
    struct RecordingBackend {
        last: Mutex<Vec<ChatMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, messages: Vec<ChatMessage>, _timeout: Duration) -> Result<String> {
            *self.last.lock() = messages;
            if self.fail {
                Err(ServiceError::RemoteUnavailable("HTTP 500: boom".to_string()))
            } else {
                Ok("Actuators convert energy into motion.".to_string())
            }
        }
    }

    struct FixedStore(Vec<ContextItem>);

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn search_context(&self, _query: &str, limit: usize) -> Result<Vec<ContextItem>> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl VectorStore for BrokenStore {
        async fn search_context(&self, _query: &str, _limit: usize) -> Result<Vec<ContextItem>> {
            Err(ServiceError::RemoteUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_ask_uses_store_context() {
        let backend = Arc::new(RecordingBackend::default());
        let store = Arc::new(FixedStore(vec![
            ContextItem::new("Servo motors", "ch3.md"),
            ContextItem::new("Stepper motors", "ch3.md"),
        ]));
        let rag = RagService::new(backend.clone(), Some(store), 5, Duration::from_secs(60));

        let result = rag.ask("What is an actuator?", "Hardware").await;
        assert!(result.success);
        assert_eq!(result.context.len(), 2);

        let messages = backend.last.lock().clone();
        assert!(messages[0].content.contains("User Background: Hardware"));
        assert_eq!(
            messages[1].content,
            "Context:\nServo motors\n\nStepper motors\n\nQuestion: What is an actuator?"
        );
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty_context() {
        let backend = Arc::new(RecordingBackend::default());
        let rag = RagService::new(backend, Some(Arc::new(BrokenStore)), 5, Duration::from_secs(60));

        let result = rag.ask("q", "General").await;
        assert!(result.success);
        assert!(result.context.is_empty());
    }

    #[tokio::test]
    async fn test_ask_selection_context() {
        let backend = Arc::new(RecordingBackend::default());
        let rag = RagService::new(backend, None, 5, Duration::from_secs(60));

        let result = rag.ask_selection("Explain", "Inverse kinematics").await;
        assert_eq!(result.context, vec![ContextItem::new("Inverse kinematics", "User Selection")]);
    }

    #[tokio::test]
    async fn test_remote_failure_is_structured() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        let rag = RagService::new(backend, None, 5, Duration::from_secs(60));

        let result = rag.personalize("Some text", "beginner").await;
        assert!(!result.success);
        assert_eq!(result.meta.level, "beginner");
        let error = result.error.unwrap();
        assert!(!error.contains("boom"));
    }
}
