//! Configuration data structures for the textbook backend.
//!
//! This module defines the schema for the application settings: the HTTP
//! server, the OpenRouter completion endpoint, the Supabase auth/profile
//! store, the Qdrant vector store, the translation cache, and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, CORS).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream OpenRouter chat-completion settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Supabase auth and profile table settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Qdrant vector store settings.
    #[serde(default)]
    pub qdrant: QdrantConfig,

    /// Translation cache and dispatch settings.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer. `*` allows any origin.
    /// Default: `["*"]`
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Maximum accepted request body size in bytes.
    /// Default: 2 MiB
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Settings for the upstream OpenRouter connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Bearer credential. The server refuses to start without one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the OpenRouter API.
    /// Default: `https://openrouter.ai/api/v1`
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Model identifier sent with every completion request.
    /// Default: `meta-llama/llama-3.2-3b-instruct:free`
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout for translation calls in seconds.
    /// Default: `30`
    #[serde(default = "default_translation_timeout")]
    pub translation_timeout_seconds: u64,

    /// Timeout for question answering and personalization calls in seconds.
    /// Default: `60`
    #[serde(default = "default_answer_timeout")]
    pub answer_timeout_seconds: u64,

    /// Value of the `HTTP-Referer` header.
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Value of the `X-Title` header.
    #[serde(default = "default_title")]
    pub title: String,
}

/// Settings for the Supabase auth and profile store.
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,

    /// Service-role key, needed for admin deletes and profile writes.
    #[serde(default)]
    pub service_role_key: Option<String>,

    /// Name of the profile table.
    /// Default: `profiles`
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,

    /// Request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_collaborator_timeout")]
    pub timeout_seconds: u64,
}

/// Settings for the Qdrant vector store.
#[derive(Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// REST endpoint, e.g. `http://localhost:6333`.
    #[serde(default)]
    pub url: Option<String>,

    /// Optional API key sent as the `api-key` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Collection holding the textbook chunks.
    /// Default: `physical_ai_textbook`
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Maximum number of context items fetched per question.
    /// Default: `5`
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_collaborator_timeout")]
    pub timeout_seconds: u64,
}

/// Settings for the translation cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Age after which a cached translation is treated as stale.
    /// Default: `24`
    #[serde(default = "default_cache_expiry_hours")]
    pub cache_expiry_hours: i64,

    /// Number of batch items translated at the same time.
    /// Default: `4`
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Custom Debug impls that never log credentials

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("translation_timeout_seconds", &self.translation_timeout_seconds)
            .field("answer_timeout_seconds", &self.answer_timeout_seconds)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &redacted(&self.service_role_key))
            .field("profiles_table", &self.profiles_table)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl std::fmt::Debug for QdrantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantConfig")
            .field("url", &self.url)
            .field("api_key", &redacted(&self.api_key))
            .field("collection", &self.collection)
            .field("search_limit", &self.search_limit)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "[REDACTED]",
        None => "<unset>",
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openrouter_base_url(),
            model: default_model(),
            translation_timeout_seconds: default_translation_timeout(),
            answer_timeout_seconds: default_answer_timeout(),
            referer: default_referer(),
            title: default_title(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            profiles_table: default_profiles_table(),
            timeout_seconds: default_collaborator_timeout(),
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            collection: default_collection(),
            search_limit: default_search_limit(),
            timeout_seconds: default_collaborator_timeout(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            cache_expiry_hours: default_cache_expiry_hours(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "meta-llama/llama-3.2-3b-instruct:free".to_string()
}

fn default_translation_timeout() -> u64 {
    30
}

fn default_answer_timeout() -> u64 {
    60
}

fn default_referer() -> String {
    "https://physical-ai-textbook.com".to_string()
}

fn default_title() -> String {
    "Physical AI Textbook".to_string()
}

fn default_profiles_table() -> String {
    "profiles".to_string()
}

fn default_collaborator_timeout() -> u64 {
    30
}

fn default_collection() -> String {
    "physical_ai_textbook".to_string()
}

fn default_search_limit() -> usize {
    5
}

fn default_cache_expiry_hours() -> i64 {
    24
}

fn default_batch_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
