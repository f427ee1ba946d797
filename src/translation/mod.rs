//! Translation cache and dispatcher.
//!
//! Accepts (text, target language, source language), serves a fresh cached
//! translation when one exists, and otherwise asks the completion backend,
//! storing the result with a timestamp. Batch, domain-specialized and
//! context-augmented variants share the same error taxonomy.
//!
//! # Components
//!
//! - `languages`: the fixed language table, instruction templates and domains.
//! - `clock`: injectable time source for cache timestamps.
//! - `cache`: key derivation, 24h expiry check and the in-memory store.
//! - `service`: the dispatcher used by the HTTP layer.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod cache;
pub mod clock;
pub mod languages;
pub mod service;

pub use cache::{cache_key, CacheEntry, CacheStats, TranslationCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use languages::{Domain, LanguageTable, SUPPORTED_LANGUAGES};
pub use service::{
    ContextTranslationResult, TechnicalTranslationResult, Translation, TranslationResult,
    TranslationService,
};
