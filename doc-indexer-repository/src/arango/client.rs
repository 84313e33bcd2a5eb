//! ArangoDB record store client.
//!
//! Records live in ArangoDB; the pipeline fetches them by key, upserts
//! status updates, and queries for records sharing a virtual record id.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::RecordStoreError;
use crate::interfaces::RecordStore;
use doc_indexer_shared::Record;

/// Connection settings for the record database.
#[derive(Debug, Clone)]
pub struct ArangoConfig {
    /// Server URL (e.g., "http://localhost:8529").
    pub url: String,
    /// Database name.
    pub database: String,
    pub username: String,
    pub password: String,
    /// Collection holding record documents.
    pub records_collection: String,
}

/// ArangoDB-backed record store.
pub struct ArangoRecordStore {
    http: Client,
    config: ArangoConfig,
    base: String,
}

impl ArangoRecordStore {
    /// Create a new record store client.
    pub fn new(config: ArangoConfig) -> Result<Self, RecordStoreError> {
        let parsed =
            Url::parse(&config.url).map_err(|e| RecordStoreError::connection(e.to_string()))?;

        let http = Client::builder()
            .build()
            .map_err(|e| RecordStoreError::connection(e.to_string()))?;

        let base = format!(
            "{}/_db/{}",
            config.url.trim_end_matches('/'),
            config.database
        );

        info!(url = %parsed, database = %config.database, "Created ArangoDB client");

        Ok(Self { http, config, base })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base, path))
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.base, path))
            .basic_auth(&self.config.username, Some(&self.config.password))
    }
}

#[async_trait]
impl RecordStore for ArangoRecordStore {
    #[instrument(skip(self))]
    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> Result<Option<Record>, RecordStoreError> {
        let response = self
            .get(&format!("/_api/document/{}/{}", collection, id))
            .send()
            .await
            .map_err(|e| RecordStoreError::connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RecordStoreError::query(format!(
                "get document failed with status {}: {}",
                status, body
            )));
        }

        let doc: Record = response
            .json()
            .await
            .map_err(|e| RecordStoreError::invalid_response(e.to_string()))?;

        debug!(id = %id, collection = %collection, "Fetched record");
        Ok(Some(doc))
    }

    #[instrument(skip(self, docs), fields(doc_count = docs.len()))]
    async fn batch_upsert(
        &self,
        docs: Vec<Record>,
        collection: &str,
    ) -> Result<(), RecordStoreError> {
        if docs.is_empty() {
            return Ok(());
        }

        let count = docs.len();
        let response = self
            .post(&format!(
                "/_api/document/{}?overwrite=true&silent=true",
                collection
            ))
            .json(&docs)
            .send()
            .await
            .map_err(|e| RecordStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RecordStoreError::upsert(format!(
                "batch upsert failed with status {}: {}",
                status, body
            )));
        }

        debug!(collection = %collection, count = count, "Upserted records");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn records_sharing_virtual_id(
        &self,
        virtual_record_id: &str,
    ) -> Result<Vec<String>, RecordStoreError> {
        let query = format!(
            "FOR r IN {} FILTER r.virtualRecordId == @vid RETURN r._key",
            self.config.records_collection
        );

        let response = self
            .post("/_api/cursor")
            .json(&json!({
                "query": query,
                "bindVars": { "vid": virtual_record_id }
            }))
            .send()
            .await
            .map_err(|e| RecordStoreError::connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RecordStoreError::query(format!(
                "cursor query failed with status {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RecordStoreError::invalid_response(e.to_string()))?;

        let keys = body["result"]
            .as_array()
            .ok_or_else(|| RecordStoreError::invalid_response("cursor response missing result"))?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config(url: &str) -> ArangoConfig {
        ArangoConfig {
            url: url.to_string(),
            database: "docs".to_string(),
            username: "root".to_string(),
            password: "secret".to_string(),
            records_collection: "records".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_document_missing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/_db/docs/_api/document/records/r1");
            then.status(404).json_body(json!({ "error": true, "code": 404 }));
        });

        let store = ArangoRecordStore::new(config(&server.base_url())).unwrap();
        assert!(store.get_document("r1", "records").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_sharing_virtual_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/_db/docs/_api/cursor");
            then.status(201).json_body(json!({
                "result": ["r1", "r2"],
                "hasMore": false
            }));
        });

        let store = ArangoRecordStore::new(config(&server.base_url())).unwrap();
        let keys = store.records_sharing_virtual_id("v1").await.unwrap();
        assert_eq!(keys, vec!["r1".to_string(), "r2".to_string()]);
    }
}
