// Translation service behaviour tests
// Author: kelexine (https://github.com/kelexine)

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use textbook_backend::config::TranslationConfig;
use textbook_backend::error::{Result, ServiceError};
use textbook_backend::llm::{ChatMessage, CompletionBackend};
use textbook_backend::translation::{Domain, ManualClock, TranslationService};

/// Answers from a fixed table keyed by the text being translated.
struct ScriptedBackend {
    calls: AtomicUsize,
    configured: bool,
    answers: Vec<(&'static str, &'static str)>,
    last_messages: parking_lot::Mutex<Vec<ChatMessage>>,
}

impl ScriptedBackend {
    fn new(answers: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            configured: true,
            answers,
            last_messages: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, messages: Vec<ChatMessage>, _timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        *self.last_messages.lock() = messages;

        self.answers
            .iter()
            .find(|(text, _)| user.ends_with(text))
            .map(|(_, answer)| answer.to_string())
            .ok_or_else(|| ServiceError::RemoteUnavailable("HTTP 500: boom".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

fn service(backend: Arc<ScriptedBackend>, clock: Arc<ManualClock>) -> TranslationService {
    TranslationService::new(
        backend,
        clock,
        &TranslationConfig::default(),
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let backend = Arc::new(ScriptedBackend::new(vec![("Hello", "سلام")]));
    let svc = service(backend.clone(), Arc::new(ManualClock::default()));

    let first = svc.translate_result("Hello", "ur", "en").await;
    assert!(first.success);
    assert_eq!(first.translation.as_deref(), Some("سلام"));
    assert!(!first.cached);

    let second = svc.translate_result("Hello", "ur", "en").await;
    assert_eq!(second.translation.as_deref(), Some("سلام"));
    assert!(second.cached);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_unsupported_language_makes_no_remote_call() {
    let backend = Arc::new(ScriptedBackend::new(vec![("Hello", "x")]));
    let svc = service(backend.clone(), Arc::new(ManualClock::default()));

    let result = svc.translate_result("Hello", "xx", "en").await;
    assert!(!result.success);
    assert!(result.translation.is_none());
    let error = result.error.unwrap();
    assert!(error.starts_with("Unsupported target language: xx"));
    assert!(error.contains("ur"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_source_language_is_not_part_of_the_key() {
    let backend = Arc::new(ScriptedBackend::new(vec![("Hello", "Hola")]));
    let svc = service(backend.clone(), Arc::new(ManualClock::default()));

    svc.translate("Hello", "hi", "en").await.unwrap();
    let again = svc.translate("Hello", "hi", "ar").await.unwrap();

    assert!(again.cached);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_expiry_boundary() {
    let backend = Arc::new(ScriptedBackend::new(vec![("Hello", "Bonjour")]));
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let svc = service(backend.clone(), clock.clone());

    svc.translate("Hello", "ar", "en").await.unwrap();

    clock.advance(ChronoDuration::hours(23) + ChronoDuration::minutes(59));
    assert!(svc.translate("Hello", "ar", "en").await.unwrap().cached);

    clock.advance(ChronoDuration::minutes(2));
    let stats = svc.cache_stats();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.expired_entries, 1);

    let refreshed = svc.translate("Hello", "ar", "en").await.unwrap();
    assert!(!refreshed.cached);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_stats_after_clear() {
    let backend = Arc::new(ScriptedBackend::new(vec![("A", "a"), ("B", "b")]));
    let svc = service(backend, Arc::new(ManualClock::default()));

    svc.translate("A", "bn", "en").await.unwrap();
    svc.translate("B", "bn", "en").await.unwrap();
    assert_eq!(svc.cache_stats().total_entries, 2);

    svc.clear_cache();
    let stats = svc.cache_stats();
    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.valid_entries, 0);
    assert_eq!(stats.expired_entries, 0);
    assert_eq!(stats.expiry_hours, 24);
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let backend = Arc::new(ScriptedBackend::new(vec![("first", "eins")]));
    let svc = service(backend, Arc::new(ManualClock::default()));

    let texts = vec!["first".to_string(), "second".to_string()];
    let results = svc.translate_batch(&texts, "bn", "en").await;

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert_eq!(results[0].original_text, "first");
    assert_eq!(results[0].translation.as_deref(), Some("eins"));

    assert!(!results[1].success);
    assert_eq!(results[1].original_text, "second");
    assert_eq!(
        results[1].error.as_deref(),
        Some("Translation failed. Please try again later.")
    );
}

#[tokio::test]
async fn test_empty_batch() {
    let backend = Arc::new(ScriptedBackend::new(Vec::new()));
    let svc = service(backend.clone(), Arc::new(ManualClock::default()));

    assert!(svc.translate_batch(&[], "ur", "en").await.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_missing_key_fails_every_path() {
    let backend = Arc::new(ScriptedBackend::unconfigured());
    let svc = service(backend.clone(), Arc::new(ManualClock::default()));

    let plain = svc.translate_result("Hello", "ur", "en").await;
    assert_eq!(plain.error.as_deref(), Some("API key not configured"));

    let technical = svc.translate_technical_result("Hello", "ur", "robotics").await;
    assert!(!technical.success);
    assert_eq!(technical.error.as_deref(), Some("API key not configured"));

    let context = svc.translate_with_context_result("Hello", "ur", "ctx").await;
    assert!(!context.success);
    assert!(context.context_used);

    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_technical_and_context_bypass_cache() {
    let backend = Arc::new(ScriptedBackend::new(vec![("ROS node", "ROS نوڈ")]));
    let svc = service(backend.clone(), Arc::new(ManualClock::default()));

    for _ in 0..2 {
        let result = svc
            .translate_technical("ROS node", "ur", Domain::Robotics)
            .await
            .unwrap();
        assert_eq!(result, "ROS نوڈ");
    }
    let system = backend.last_messages.lock()[0].content.clone();
    assert!(system.contains("robotics"));
    assert!(system.contains("Urdu"));

    let context = svc.translate_with_context_result("ROS node", "ur", "").await;
    assert!(context.success);
    assert!(!context.context_used);

    assert_eq!(backend.calls(), 3);
    assert_eq!(svc.cache_stats().total_entries, 0);
}

#[tokio::test]
async fn test_unknown_domain_uses_general() {
    let backend = Arc::new(ScriptedBackend::new(vec![("x", "y")]));
    let svc = service(backend, Arc::new(ManualClock::default()));

    let result = svc.translate_technical_result("x", "hi", "astronomy").await;
    assert!(result.success);
    assert_eq!(result.domain, Domain::General);
}

#[tokio::test]
async fn test_language_table() {
    let backend = Arc::new(ScriptedBackend::new(Vec::new()));
    let svc = service(backend, Arc::new(ManualClock::default()));

    let json = serde_json::to_value(svc.supported_languages()).unwrap();
    let table = json.as_object().unwrap();
    assert_eq!(table.len(), 10);
    assert_eq!(table["ur"], "Urdu");
    assert_eq!(table["pa"], "Punjabi");
}
