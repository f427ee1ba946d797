//! Structured logging and secret redaction.
//!
//! This module configures the `tracing` ecosystem for the application and
//! provides a sanitizer so upstream error bodies can be logged without
//! leaking API keys or session tokens.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Multi-line, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Token prefixes that are redacted wherever they appear, with their placeholder.
const SECRET_PATTERNS: &[(&str, &str)] = &[
    ("sk-or-", "[REDACTED_API_KEY]"),
    ("eyJ", "[REDACTED_JWT]"),
    ("Bearer ", "Bearer [REDACTED]"),
];

/// Sanitizes sensitive information from log messages.
///
/// Every occurrence of an OpenRouter key (`sk-or-...`), a JWT (`eyJ...`,
/// which covers Supabase access tokens and service-role keys) or a bearer
/// credential is replaced with a placeholder. A secret runs until the next
/// whitespace, quote, or comma.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    for (prefix, placeholder) in SECRET_PATTERNS {
        let mut search_from = 0;
        while let Some(offset) = result[search_from..].find(prefix) {
            let start = search_from + offset;
            let secret_start = start + prefix.len();
            let end = result[secret_start..]
                .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ',')
                .map(|i| secret_start + i)
                .unwrap_or(result.len());

            // "Bearer " followed directly by a delimiter has nothing to hide
            if end == secret_start {
                search_from = secret_start;
                continue;
            }

            result.replace_range(start..end, placeholder);
            search_from = start + placeholder.len();
        }
    }

    result
}
