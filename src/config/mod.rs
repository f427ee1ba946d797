// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{Result, ServiceError};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Deployment variables (`OPENROUTER_API_KEY`, `SUPABASE_URL`, ...)
    /// 3. Prefixed environment variables (`TEXTBOOK_<SECTION>__<KEY>`)
    /// 4. Config file
    /// 5. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // An explicit --config path must exist, the default one may not
            .add_source(File::from(file_path).required(path.is_some()))
            // Override with environment variables (prefix: TEXTBOOK_)
            .add_source(
                Environment::with_prefix("TEXTBOOK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        app_config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(app_config)
    }

    /// Apply the bare variable names the deployment has always used.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            self.openrouter.api_key = Some(key);
        }
        if let Some(model) = non_empty("OPENROUTER_MODEL") {
            self.openrouter.model = model;
        }
        if let Some(url) = non_empty("SUPABASE_URL") {
            self.supabase.url = Some(url);
        }
        if let Some(key) = non_empty("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_role_key = Some(key);
        }
        if let Some(url) = non_empty("QDRANT_URL") {
            self.qdrant.url = Some(url);
        }
        if let Some(key) = non_empty("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(key);
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let has_key = self
            .openrouter
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(ServiceError::ConfigurationMissing(
                "OpenRouter API key (set OPENROUTER_API_KEY)".to_string(),
            ));
        }

        let expiry_hours = self.translation.cache_expiry_hours;
        if expiry_hours <= 0 || chrono::Duration::try_hours(expiry_hours).is_none() {
            return Err(ServiceError::Config(format!(
                "translation.cache_expiry_hours must be a positive number of hours in range, got {}",
                expiry_hours
            )));
        }

        if self.translation.batch_concurrency == 0 {
            return Err(ServiceError::Config(
                "translation.batch_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".textbook-backend")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.openrouter.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.translation.cache_expiry_hours, 24);
        assert_eq!(config.qdrant.search_limit, 5);
        assert!(config.openrouter.api_key.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[openrouter]
api_key = "sk-or-file"
model = "qwen/qwen-2.5-7b-instruct:free"

[translation]
cache_expiry_hours = 12
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.translation.cache_expiry_hours, 12);
        // Untouched sections keep their defaults
        assert_eq!(config.qdrant.collection, "physical_ai_textbook");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/textbook.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OPENROUTER_API_KEY", "sk-or-env"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("QDRANT_URL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.openrouter.api_key.as_deref(), Some("sk-or-env"));
        assert_eq!(config.supabase.url.as_deref(), Some("https://project.supabase.co"));
        // Blank values are ignored
        assert!(config.qdrant.url.is_none());
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ServiceError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_expiry() {
        let mut config = AppConfig::default();
        config.openrouter.api_key = Some("sk-or-test".to_string());

        for hours in [0, -5, i64::MAX] {
            config.translation.cache_expiry_hours = hours;
            assert!(matches!(config.validate(), Err(ServiceError::Config(_))));
        }

        config.translation.cache_expiry_hours = 24 * 365;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let mut config = AppConfig::default();
        config.openrouter.api_key = Some("sk-or-v1-secret".to_string());
        config.supabase.service_role_key = Some("service-secret".to_string());

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("sk-or-v1-secret"));
        assert!(!debug_str.contains("service-secret"));
    }
}
