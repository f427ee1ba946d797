// Translation cache - key derivation, expiry and bookkeeping
// Author: kelexine (https://github.com/kelexine)

use super::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A stored translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub translation: String,
    pub timestamp: DateTime<Utc>,
    pub source_lang: String,
    pub target_lang: String,
}

/// Counts produced by a full scan of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub expiry_hours: i64,
}

/// Generate SHA256 cache key from the text and target language.
///
/// The source language is deliberately not part of the key. The text is
/// length-prefixed so no (text, target) pair can collide with another by
/// shifting characters across the boundary.
pub fn cache_key(text: &str, target_lang: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    hasher.update(target_lang.as_bytes());
    hex::encode(hasher.finalize())
}

/// An entry is valid while strictly less than `expiry` has elapsed since it was written.
pub fn is_valid(entry: &CacheEntry, now: DateTime<Utc>, expiry: Duration) -> bool {
    now - entry.timestamp < expiry
}

/// In-memory translation cache.
///
/// Unbounded. Expired entries are never evicted; they are skipped on read and
/// stay stored until `clear`.
pub struct TranslationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    expiry: Duration,
    clock: Arc<dyn Clock>,
}

impl TranslationCache {
    /// An expiry beyond what `Duration` can hold saturates to the maximum.
    pub fn new(expiry_hours: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            expiry: Duration::try_hours(expiry_hours).unwrap_or(Duration::MAX),
            clock,
        }
    }

    pub fn expiry_hours(&self) -> i64 {
        self.expiry.num_hours()
    }

    /// Look up a key, returning the entry only if it is still valid.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .filter(|entry| is_valid(entry, now, self.expiry))
            .cloned()
    }

    /// Store a translation stamped with the current time. Last writer wins.
    pub fn insert(&self, key: String, translation: String, source_lang: &str, target_lang: &str) {
        let entry = CacheEntry {
            translation,
            timestamp: self.clock.now(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        };
        self.entries.write().insert(key, entry);
    }

    /// Scan every entry against the expiry window.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read();
        let valid_entries = entries
            .values()
            .filter(|entry| is_valid(entry, now, self.expiry))
            .count();

        CacheStats {
            total_entries: entries.len(),
            valid_entries,
            expired_entries: entries.len() - valid_entries,
            expiry_hours: self.expiry_hours(),
        }
    }

    /// Drop all entries.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        debug!("Translation cache cleared ({} entries)", removed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
