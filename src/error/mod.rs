// Error types for textbook-backend
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Machine-readable error kind used in JSON bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::UnsupportedLanguage(_) => "unsupported_language",
            ServiceError::ConfigurationMissing(_) => "configuration_missing",
            ServiceError::RemoteUnavailable(_) | ServiceError::Http(_) => "remote_unavailable",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidRequest(_) | ServiceError::Json(_) => "invalid_request_error",
            ServiceError::Unauthorized(_) => "authentication_error",
            ServiceError::Config(_) | ServiceError::ConfigParsing(_) => "configuration_error",
            ServiceError::Io(_) | ServiceError::Internal(_) => "api_error",
        }
    }

    /// Whether the error is one of the collapsed remote failure kinds.
    pub fn is_remote(&self) -> bool {
        matches!(self, ServiceError::RemoteUnavailable(_) | ServiceError::Http(_))
    }
}

// Convert ServiceError to HTTP responses for Axum
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::UnsupportedLanguage(_)
            | ServiceError::InvalidRequest(_)
            | ServiceError::Json(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::RemoteUnavailable(_) | ServiceError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Transport details stay in the logs
        let message = if self.is_remote() {
            "Upstream service unavailable. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": self.kind(),
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
