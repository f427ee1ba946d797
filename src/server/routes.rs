// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    ask_handler, ask_selection_handler, cache_stats_handler, clear_cache_handler,
    health_handler, languages_handler, me_handler, metrics_handler, personalize_handler,
    signin_handler, signup_handler, translate_batch_handler, translate_context_handler,
    translate_handler, translate_technical_handler, update_me_handler,
};
use super::middleware::{cors_layer, record_request_metrics, request_id_layers};
use crate::auth::{AuthService, SupabaseClient};
use crate::config::AppConfig;
use crate::error::{Result, ServiceError};
use crate::llm::{CompletionBackend, OpenRouterClient};
use crate::rag::{QdrantClient, RagService, VectorStore};
use crate::translation::{SystemClock, TranslationService};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub translation: Arc<TranslationService>,
    pub rag: Arc<RagService>,
    /// `None` when Supabase is not configured
    pub auth: Option<Arc<AuthService>>,
}

impl AppState {
    /// Construct every collaborator client up front.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let backend: Arc<dyn CompletionBackend> = Arc::new(OpenRouterClient::new(&config.openrouter)?);

        let translation = TranslationService::new(
            backend.clone(),
            Arc::new(SystemClock),
            &config.translation,
            Duration::from_secs(config.openrouter.translation_timeout_seconds),
        );

        let store: Option<Arc<dyn VectorStore>> = match config.qdrant.url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                info!("Using Qdrant collection '{}' at {}", config.qdrant.collection, url);
                Some(Arc::new(QdrantClient::new(&config.qdrant, url)?))
            }
            _ => {
                warn!("Qdrant not configured; answers will have no textbook context");
                None
            }
        };

        let rag = RagService::new(
            backend,
            store,
            config.qdrant.search_limit,
            Duration::from_secs(config.openrouter.answer_timeout_seconds),
        );

        let auth = match SupabaseClient::new(&config.supabase) {
            Ok(client) => Some(Arc::new(AuthService::new(client))),
            Err(ServiceError::ConfigurationMissing(what)) => {
                warn!("Auth endpoints disabled: missing {}", what);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            config: Arc::new(config),
            translation: Arc::new(translation),
            rag: Arc::new(rag),
            auth,
        })
    }

    pub fn auth(&self) -> Result<&AuthService> {
        self.auth.as_deref().ok_or_else(|| {
            ServiceError::ConfigurationMissing("Supabase credentials not configured".to_string())
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();
    let cors = cors_layer(&state.config.server.cors_allowed_origins);
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/rag/ask", post(ask_handler))
        .route("/rag/ask-selection", post(ask_selection_handler))
        .route("/rag/personalize", post(personalize_handler))
        .route("/rag/translate", post(translate_handler))
        .route("/rag/translate/batch", post(translate_batch_handler))
        .route("/rag/translate/technical", post(translate_technical_handler))
        .route("/rag/translate/context", post(translate_context_handler))
        .route("/rag/translate/languages", get(languages_handler))
        .route(
            "/rag/translate/cache",
            get(cache_stats_handler).delete(clear_cache_handler),
        )
        .route("/auth/signup", post(signup_handler))
        .route("/auth/signin", post(signin_handler))
        .route("/auth/me", get(me_handler).patch(update_me_handler))
        .route_layer(middleware::from_fn(record_request_metrics))
        .layer(tower_http::limit::RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
