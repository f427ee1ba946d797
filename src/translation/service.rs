// Translation dispatcher - cache lookup, remote call, result shaping
// Author: kelexine (https://github.com/kelexine)

use super::cache::{cache_key, CacheStats, TranslationCache};
use super::clock::Clock;
use super::languages::{self, Domain, LanguageTable};
use crate::config::TranslationConfig;
use crate::error::{Result, ServiceError};
use crate::llm::{ChatMessage, CompletionBackend};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// A successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub cached: bool,
}

/// Payload for plain and batch translation.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub success: bool,
    pub translation: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub original_text: String,
    pub cached: bool,
    pub error: Option<String>,
}

/// Payload for domain-specialized translation.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalTranslationResult {
    pub success: bool,
    pub translation: Option<String>,
    pub domain: Domain,
    pub source_lang: String,
    pub target_lang: String,
    pub error: Option<String>,
}

/// Payload for context-augmented translation.
#[derive(Debug, Clone, Serialize)]
pub struct ContextTranslationResult {
    pub success: bool,
    pub translation: Option<String>,
    pub context_used: bool,
    pub source_lang: String,
    pub target_lang: String,
    pub error: Option<String>,
}

/// Human-readable reason for a failed translation. Transport details are not exposed.
pub fn failure_message(err: &ServiceError) -> String {
    match err {
        ServiceError::UnsupportedLanguage(code) => format!(
            "Unsupported target language: {}. Supported: [{}]",
            code,
            languages::supported_codes()
        ),
        ServiceError::ConfigurationMissing(_) => "API key not configured".to_string(),
        _ => "Translation failed. Please try again later.".to_string(),
    }
}

/// Translation cache and dispatcher.
///
/// Plain and batch translations go through the cache; domain and context
/// translations always call the remote model.
pub struct TranslationService {
    backend: Arc<dyn CompletionBackend>,
    cache: TranslationCache,
    /// Per-key locks so concurrent misses for one key make a single remote call
    inflight: parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
    batch_concurrency: usize,
}

impl TranslationService {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        clock: Arc<dyn Clock>,
        config: &TranslationConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            cache: TranslationCache::new(config.cache_expiry_hours, clock),
            inflight: parking_lot::Mutex::new(HashMap::new()),
            timeout,
            batch_concurrency: config.batch_concurrency.max(1),
        }
    }

    /// Translate one text, serving a fresh cached result when there is one.
    ///
    /// Fails with `UnsupportedLanguage` before any lookup or remote call when
    /// `target_lang` is not in the language table. `source_lang` is recorded
    /// with the entry but is not part of the cache key.
    pub async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<Translation> {
        if !languages::is_supported(target_lang) {
            return Err(ServiceError::UnsupportedLanguage(target_lang.to_string()));
        }

        let key = cache_key(text, target_lang);
        if let Some(entry) = self.cache.get(&key) {
            debug!("Translation cache hit: {}", &key[..16]);
            crate::metrics::record_translation_cache_hit();
            return Ok(Translation {
                text: entry.translation,
                cached: true,
            });
        }

        if !self.backend.is_configured() {
            return Err(ServiceError::ConfigurationMissing(
                "OpenRouter API key not configured".to_string(),
            ));
        }

        // Released on drop, so a cancelled request cannot leave its entry behind
        let flight = self.flight_lock(&key);
        let _guard = flight.lock.lock().await;

        // Another request may have filled the entry while we waited
        if let Some(entry) = self.cache.get(&key) {
            debug!("Translation filled by concurrent request: {}", &key[..16]);
            crate::metrics::record_translation_cache_hit();
            return Ok(Translation {
                text: entry.translation,
                cached: true,
            });
        }

        debug!("Translation cache miss: {}", &key[..16]);
        crate::metrics::record_translation_cache_miss();
        self.fetch_and_store(&key, text, target_lang, source_lang).await
    }

    async fn fetch_and_store(
        &self,
        key: &str,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> Result<Translation> {
        let messages = vec![
            ChatMessage::system(languages::language_instruction(target_lang)),
            ChatMessage::user(languages::translation_payload(text)),
        ];
        let translation = self.call_remote(messages).await?;

        self.cache
            .insert(key.to_string(), translation.clone(), source_lang, target_lang);
        crate::metrics::record_translation_cache_store();

        Ok(Translation {
            text: translation,
            cached: false,
        })
    }

    /// Translate one text and shape the outcome into a result payload.
    pub async fn translate_result(&self, text: &str, target_lang: &str, source_lang: &str) -> TranslationResult {
        let outcome = self.translate(text, target_lang, source_lang).await;
        if let Err(e) = &outcome {
            warn!("Translation to {} failed: {}", target_lang, e);
        }

        let (success, translation, cached, error) = match outcome {
            Ok(t) => (true, Some(t.text), t.cached, None),
            Err(e) => (false, None, false, Some(failure_message(&e))),
        };

        TranslationResult {
            success,
            translation,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            original_text: text.to_string(),
            cached,
            error,
        }
    }

    /// Translate every text independently, preserving input order.
    ///
    /// A failing item does not abort the batch; each result carries its own state.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: &str,
    ) -> Vec<TranslationResult> {
        info!(
            "Batch translation: {} texts to {}",
            texts.len(),
            target_lang
        );

        let futures: Vec<_> = texts
            .iter()
            .map(|text| self.translate_result(text, target_lang, source_lang))
            .collect();
        stream::iter(futures)
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    /// Translate with a topic-specific instruction. Never touches the cache.
    pub async fn translate_technical(&self, text: &str, target_lang: &str, domain: Domain) -> Result<String> {
        if !self.backend.is_configured() {
            return Err(ServiceError::ConfigurationMissing(
                "OpenRouter API key not configured".to_string(),
            ));
        }

        let messages = vec![
            ChatMessage::system(domain.instruction(target_lang)),
            ChatMessage::user(languages::translation_payload(text)),
        ];
        self.call_remote(messages).await
    }

    pub async fn translate_technical_result(
        &self,
        text: &str,
        target_lang: &str,
        domain_tag: &str,
    ) -> TechnicalTranslationResult {
        let domain = Domain::parse(domain_tag);
        let (success, translation, error) = match self.translate_technical(text, target_lang, domain).await {
            Ok(t) => (true, Some(t), None),
            Err(e) => {
                warn!("Technical translation ({}) failed: {}", domain.as_str(), e);
                (false, None, Some(failure_message(&e)))
            }
        };

        TechnicalTranslationResult {
            success,
            translation,
            domain,
            source_lang: "en".to_string(),
            target_lang: target_lang.to_string(),
            error,
        }
    }

    /// Translate with an auxiliary context string prepended to the request.
    /// Never touches the cache.
    pub async fn translate_with_context(&self, text: &str, target_lang: &str, context: &str) -> Result<String> {
        if !self.backend.is_configured() {
            return Err(ServiceError::ConfigurationMissing(
                "OpenRouter API key not configured".to_string(),
            ));
        }

        let messages = vec![
            ChatMessage::system(languages::CONTEXT_TRANSLATOR_INSTRUCTION),
            ChatMessage::user(languages::context_payload(text, target_lang, context)),
        ];
        self.call_remote(messages).await
    }

    pub async fn translate_with_context_result(
        &self,
        text: &str,
        target_lang: &str,
        context: &str,
    ) -> ContextTranslationResult {
        let (success, translation, error) = match self.translate_with_context(text, target_lang, context).await {
            Ok(t) => (true, Some(t), None),
            Err(e) => {
                warn!("Context translation failed: {}", e);
                (false, None, Some(failure_message(&e)))
            }
        };

        ContextTranslationResult {
            success,
            translation,
            context_used: !context.is_empty(),
            source_lang: "en".to_string(),
            target_lang: target_lang.to_string(),
            error,
        }
    }

    pub fn supported_languages(&self) -> LanguageTable {
        LanguageTable
    }

    /// Rescan the cache. O(n) in the number of stored entries.
    pub fn cache_stats(&self) -> CacheStats {
        let stats = self.cache.stats();
        crate::metrics::update_translation_cache_entries(stats.valid_entries, stats.expired_entries);
        stats
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        crate::metrics::record_translation_cache_clear();
        crate::metrics::update_translation_cache_entries(0, 0);
        info!("Translation cache cleared");
    }

    /// One remote call; the trimmed content must be non-empty.
    async fn call_remote(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let content = self.backend.complete(messages, self.timeout).await?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::RemoteUnavailable(
                "Completion returned empty text".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn flight_lock<'a>(&'a self, key: &'a str) -> FlightLock<'a> {
        let lock = self
            .inflight
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        FlightLock {
            service: self,
            key,
            lock,
        }
    }

    #[cfg(test)]
    pub(crate) fn inflight_len(&self) -> usize {
        self.inflight.lock().len()
    }
}

/// Per-key lock handle. Removes the map entry on drop once no one else holds it.
struct FlightLock<'a> {
    service: &'a TranslationService,
    key: &'a str,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for FlightLock<'_> {
    fn drop(&mut self) {
        let mut inflight = self.service.inflight.lock();
        // Only the map and this handle hold it: nobody else is waiting
        let idle = inflight
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.lock) && Arc::strong_count(&self.lock) <= 2);
        if idle {
            inflight.remove(self.key);
        }
    }
}
