// Qdrant REST client used as the context source for answers
// Author: kelexine (https://github.com/kelexine)

use crate::config::QdrantConfig;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// One stored textbook chunk, as returned in a point payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContextItem {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: Some(source.into()),
            extra: Map::new(),
        }
    }
}

/// Source of context items for a question.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `limit` items for `query`. An absent collection yields an empty list.
    async fn search_context(&self, query: &str, limit: usize) -> Result<Vec<ContextItem>>;
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    #[serde(default)]
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct Point {
    #[serde(default)]
    payload: Option<ContextItem>,
}

#[derive(Debug, Serialize)]
struct ScrollRequest {
    limit: usize,
    with_payload: bool,
}

/// Qdrant client over the REST API.
///
/// This does not run a similarity query: it checks that the collection
/// exists and then scrolls the first `limit` points.
pub struct QdrantClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantClient {
    pub fn new(config: &QdrantConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .map_err(|e| ServiceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn collection_exists(&self) -> Result<bool> {
        let url = format!("{}/collections", self.base_url);
        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("HTTP error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::RemoteUnavailable(format!(
                "Listing collections failed: HTTP {}",
                status.as_u16()
            )));
        }

        let list: QdrantResponse<CollectionList> = response
            .json()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("Invalid response: {}", e)))?;

        Ok(list.result.collections.iter().any(|c| c.name == self.collection))
    }

    async fn scroll(&self, limit: usize) -> Result<Vec<ContextItem>> {
        let url = format!("{}/collections/{}/points/scroll", self.base_url, self.collection);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(&ScrollRequest {
                limit,
                with_payload: true,
            })
            .send()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("HTTP error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::RemoteUnavailable(format!(
                "Scroll failed: HTTP {}",
                status.as_u16()
            )));
        }

        let scroll: QdrantResponse<ScrollResult> = response
            .json()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("Invalid response: {}", e)))?;

        Ok(scroll
            .result
            .points
            .into_iter()
            .filter_map(|p| p.payload)
            .collect())
    }
}

#[async_trait]
impl VectorStore for QdrantClient {
    async fn search_context(&self, _query: &str, limit: usize) -> Result<Vec<ContextItem>> {
        if !self.collection_exists().await? {
            warn!(
                "Collection '{}' does not exist; answering without context",
                self.collection
            );
            return Ok(Vec::new());
        }

        let items = self.scroll(limit).await?;
        debug!("Fetched {} context items from '{}'", items.len(), self.collection);
        Ok(items)
    }
}
