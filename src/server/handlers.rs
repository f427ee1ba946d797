// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::auth::{NewUser, ProfileUpdate};
use crate::error::{Result, ServiceError};
use crate::rag::{AnswerResult, PersonalizeResult};
use crate::translation::{
    CacheStats, ContextTranslationResult, LanguageTable, TechnicalTranslationResult,
    TranslationResult,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info};

// ============================================================================
// REQUEST BODIES
// ============================================================================

fn default_background() -> String {
    "General".to_string()
}

fn default_target_language() -> String {
    "ur".to_string()
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_domain() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Reader background (Software, Hardware, ...)
    #[serde(default = "default_background")]
    pub background: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub query: String,
    pub selected_text: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonalizeRequest {
    pub text: String,
    /// beginner, intermediate, expert
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_source_language")]
    pub source_language: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateBatchRequest {
    pub texts: Vec<String>,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_source_language")]
    pub source_language: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateTechnicalRequest {
    pub text: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// robotics, ai, programming, general
    #[serde(default = "default_domain")]
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateWithContextRequest {
    pub text: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Parse a JSON body, turning serde errors into `InvalidRequest`
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        ServiceError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })
}

/// Pull the token out of `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("Invalid authorization header".to_string()))
}

// ============================================================================
// HEALTH & METRICS
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

fn check(status: &str, message: String) -> HealthCheck {
    HealthCheck {
        status: status.to_string(),
        message,
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    let openrouter = &state.config.openrouter;
    checks.insert(
        "openrouter".to_string(),
        check("ok", format!("Model {} via {}", openrouter.model, openrouter.base_url)),
    );

    let auth_check = if state.auth.is_some() {
        check("ok", "Supabase configured".to_string())
    } else {
        overall_status = HealthStatus::Degraded;
        check("disabled", "Supabase credentials not configured".to_string())
    };
    checks.insert("supabase".to_string(), auth_check);

    let qdrant_check = match state.config.qdrant.url.as_deref() {
        Some(url) if !url.trim().is_empty() => check(
            "ok",
            format!("Collection {} at {}", state.config.qdrant.collection, url),
        ),
        _ => {
            overall_status = HealthStatus::Degraded;
            check("disabled", "Qdrant not configured".to_string())
        }
    };
    checks.insert("qdrant".to_string(), qdrant_check);

    let stats = state.translation.cache_stats();
    checks.insert(
        "translation_cache".to_string(),
        check(
            "ok",
            format!("{} entries ({} valid)", stats.total_entries, stats.valid_entries),
        ),
    );

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> Result<Response> {
    let body = crate::metrics::gather_metrics()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

// ============================================================================
// QUESTION ANSWERING
// ============================================================================

pub async fn ask_handler(State(state): State<AppState>, body: String) -> Result<Json<AnswerResult>> {
    let req: ChatRequest = parse_body(&body)?;
    info!("Ask: background={}, query_len={}", req.background, req.query.len());
    Ok(Json(state.rag.ask(&req.query, &req.background).await))
}

pub async fn ask_selection_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<AnswerResult>> {
    let req: SelectionRequest = parse_body(&body)?;
    info!("Ask about selection: selection_len={}", req.selected_text.len());
    Ok(Json(state.rag.ask_selection(&req.query, &req.selected_text).await))
}

pub async fn personalize_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<PersonalizeResult>> {
    let req: PersonalizeRequest = parse_body(&body)?;
    Ok(Json(state.rag.personalize(&req.text, &req.level).await))
}

// ============================================================================
// TRANSLATION
// ============================================================================

pub async fn translate_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<TranslationResult>> {
    let req: TranslateRequest = parse_body(&body)?;
    Ok(Json(
        state
            .translation
            .translate_result(&req.text, &req.target_language, &req.source_language)
            .await,
    ))
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<TranslationResult>,
}

pub async fn translate_batch_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<BatchResponse>> {
    let req: TranslateBatchRequest = parse_body(&body)?;
    let results = state
        .translation
        .translate_batch(&req.texts, &req.target_language, &req.source_language)
        .await;
    Ok(Json(BatchResponse { results }))
}

pub async fn translate_technical_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<TechnicalTranslationResult>> {
    let req: TranslateTechnicalRequest = parse_body(&body)?;
    Ok(Json(
        state
            .translation
            .translate_technical_result(&req.text, &req.target_language, &req.domain)
            .await,
    ))
}

pub async fn translate_context_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ContextTranslationResult>> {
    let req: TranslateWithContextRequest = parse_body(&body)?;
    Ok(Json(
        state
            .translation
            .translate_with_context_result(&req.text, &req.target_language, &req.context)
            .await,
    ))
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: LanguageTable,
}

pub async fn languages_handler(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: state.translation.supported_languages(),
    })
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub stats: CacheStats,
}

pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        stats: state.translation.cache_stats(),
    })
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.translation.clear_cache();
    Json(MessageResponse {
        message: "Translation cache cleared".to_string(),
    })
}

// ============================================================================
// AUTH
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: String,
}

pub async fn signup_handler(State(state): State<AppState>, body: String) -> Result<Response> {
    let auth = state.auth()?;
    let user: NewUser = parse_body(&body)?;

    let user_id = auth.create_user(&user).await.map_err(|e| {
        error!("User creation failed: {}", e);
        e
    })?;

    Ok((
        StatusCode::OK,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id,
        }),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct SigninUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub gpu: String,
    pub ros_level: String,
    pub programming_level: String,
    pub preferred_language: String,
}

#[derive(Serialize)]
pub struct SigninTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct SigninResponse {
    pub message: String,
    pub user: SigninUser,
    pub tokens: SigninTokens,
}

pub async fn signin_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<SigninResponse>> {
    let auth = state.auth()?;
    let creds: SigninRequest = parse_body(&body)?;

    let signed_in = auth.authenticate(&creds.email, &creds.password).await?;
    let profile = signed_in.profile;

    Ok(Json(SigninResponse {
        message: "Login successful".to_string(),
        user: SigninUser {
            id: profile.id,
            email: profile.email,
            name: profile.full_name,
            gpu: profile.gpu,
            ros_level: profile.ros_level,
            programming_level: profile.programming_level,
            preferred_language: profile.preferred_language,
        },
        tokens: SigninTokens {
            access_token: signed_in.tokens.access_token.clone(),
            refresh_token: signed_in.tokens.refresh_token.clone(),
        },
    }))
}

pub async fn me_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let auth = state.auth()?;
    let token = bearer_token(&headers)?;
    let user = auth.verify_token(token).await?;
    let profile = auth.get_profile(&user.id).await?;
    Ok(Json(profile).into_response())
}

pub async fn update_me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response> {
    let auth = state.auth()?;
    let token = bearer_token(&headers)?;
    let update: ProfileUpdate = parse_body(&body)?;

    let user = auth.verify_token(token).await?;
    let profile = auth.update_profile(&user.id, &update).await?;
    Ok(Json(profile).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
        assert_eq!(bearer_token(&headers).unwrap(), "tok123");
    }

    #[test]
    fn test_translate_request_defaults() {
        let req: TranslateRequest = parse_body(r#"{"text":"Hello"}"#).unwrap();
        assert_eq!(req.target_language, "ur");
        assert_eq!(req.source_language, "en");

        let req: TranslateTechnicalRequest = parse_body(r#"{"text":"x","target_language":"hi"}"#).unwrap();
        assert_eq!(req.domain, "general");
    }

    #[test]
    fn test_parse_body_rejects_missing_fields() {
        let err = parse_body::<TranslateRequest>(r#"{"target_language":"ur"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }
}
