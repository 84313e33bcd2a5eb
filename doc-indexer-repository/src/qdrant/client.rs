//! Qdrant REST client implementation.
//!
//! This module provides the concrete implementation of [`VectorStore`]
//! over the Qdrant HTTP API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::VectorStoreError;
use crate::interfaces::VectorStore;
use crate::qdrant::collection_config::{collection_body, DENSE_VECTOR_NAME};
use crate::types::{CollectionInfo, CollectionSpec, PayloadFilter, VectorPoint};

/// Page size used when scrolling point ids.
const SCROLL_PAGE_LIMIT: usize = 1000;

/// Qdrant-backed vector store.
///
/// Talks to the Qdrant REST API with a shared [`reqwest::Client`]. The api
/// key, when configured, is sent in the `api-key` header.
pub struct QdrantRestStore {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantRestStore {
    /// Create a new client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The Qdrant server URL (e.g., "http://localhost:6333")
    /// * `api_key` - Optional API key
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, VectorStoreError> {
        let parsed = Url::parse(url).map_err(|e| VectorStoreError::connection(e.to_string()))?;

        let http = Client::builder()
            .build()
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        info!(url = %parsed, "Created Qdrant client");

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(ref key) = self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }
}

#[async_trait]
impl VectorStore for QdrantRestStore {
    #[instrument(skip(self))]
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/collections/{}", name))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(VectorStoreError::collection(Self::error_body(response).await));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VectorStoreError::invalid_response(e.to_string()))?;

        let vectors = &body["result"]["config"]["params"]["vectors"];
        // Named dense vector is the provisioned layout; a bare `size` covers
        // collections created with an unnamed vector.
        let dense_size = vectors[DENSE_VECTOR_NAME]["size"]
            .as_u64()
            .or_else(|| vectors["size"].as_u64());

        Ok(Some(CollectionInfo { dense_size }))
    }

    #[instrument(skip(self, spec), fields(dense_size = spec.dense_size))]
    async fn create_collection(
        &self,
        name: &str,
        spec: &CollectionSpec,
    ) -> Result<(), VectorStoreError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", name))
            .json(&collection_body(spec))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorStoreError::collection(Self::error_body(response).await));
        }

        info!(collection = %name, dense_size = spec.dense_size, "Created collection");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, name: &str) -> Result<(), VectorStoreError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/collections/{}", name))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(VectorStoreError::collection(Self::error_body(response).await));
        }

        info!(collection = %name, "Deleted collection");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_payload_index(&self, name: &str, field: &str) -> Result<(), VectorStoreError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/collections/{}/index", name))
            .json(&json!({
                "field_name": field,
                "field_schema": "keyword"
            }))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorStoreError::collection(Self::error_body(response).await));
        }

        debug!(collection = %name, field = %field, "Created payload index");
        Ok(())
    }

    #[instrument(skip(self, points), fields(point_count = points.len()))]
    async fn upsert_points(
        &self,
        name: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorStoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let body_points: Vec<Value> = points
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "vector": { DENSE_VECTOR_NAME: p.vector },
                    "payload": p.payload
                })
            })
            .collect();

        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", name),
            )
            .json(&json!({ "points": body_points }))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorStoreError::write(Self::error_body(response).await));
        }

        debug!(collection = %name, count = points.len(), "Upserted points");
        Ok(())
    }

    #[instrument(skip(self, payload))]
    async fn set_payload(
        &self,
        name: &str,
        filter: &PayloadFilter,
        payload: Map<String, Value>,
    ) -> Result<(), VectorStoreError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/payload?wait=true", name),
            )
            .json(&json!({
                "payload": payload,
                "filter": filter.to_qdrant()
            }))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorStoreError::write(Self::error_body(response).await));
        }

        debug!(collection = %name, key = %filter.key, "Set payload by filter");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn scroll_ids(
        &self,
        name: &str,
        filter: &PayloadFilter,
    ) -> Result<Vec<String>, VectorStoreError> {
        let mut ids = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "filter": filter.to_qdrant(),
                "limit": SCROLL_PAGE_LIMIT,
                "with_payload": false,
                "with_vector": false
            });
            if let Some(ref off) = offset {
                body["offset"] = off.clone();
            }

            let response = self
                .request(
                    reqwest::Method::POST,
                    &format!("/collections/{}/points/scroll", name),
                )
                .json(&body)
                .send()
                .await
                .map_err(|e| VectorStoreError::connection(e.to_string()))?;

            if !response.status().is_success() {
                return Err(VectorStoreError::query(Self::error_body(response).await));
            }

            let page: Value = response
                .json()
                .await
                .map_err(|e| VectorStoreError::invalid_response(e.to_string()))?;

            let points = page["result"]["points"].as_array().ok_or_else(|| {
                VectorStoreError::invalid_response("scroll response missing points")
            })?;

            for point in points {
                match &point["id"] {
                    Value::String(s) => ids.push(s.clone()),
                    Value::Number(n) => ids.push(n.to_string()),
                    other => {
                        return Err(VectorStoreError::invalid_response(format!(
                            "unexpected point id: {}",
                            other
                        )))
                    }
                }
            }

            match &page["result"]["next_page_offset"] {
                Value::Null => break,
                next => offset = Some(next.clone()),
            }
        }

        debug!(collection = %name, count = ids.len(), "Scrolled point ids");
        Ok(ids)
    }

    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    async fn delete_points(&self, name: &str, ids: &[String]) -> Result<(), VectorStoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/delete?wait=true", name),
            )
            .json(&json!({ "points": ids }))
            .send()
            .await
            .map_err(|e| VectorStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorStoreError::delete(Self::error_body(response).await));
        }

        info!(collection = %name, count = ids.len(), "Deleted points");
        Ok(())
    }
}
