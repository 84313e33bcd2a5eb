//! Enhanced metadata schema.
//!
//! The reconciler normalizes the open metadata map attached to each segment
//! into this fixed schema before chunks are merged and stored. Field names
//! serialize to the exact payload keys the search side filters on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed per-segment metadata schema with explicit defaults.
///
/// Every stored point carries this shape in its payload. The aircraft
/// canonical tag is always set; `"unknown"` is a valid value, and callers
/// must not use it to pre-filter queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedMetadata {
    pub org_id: String,
    pub virtual_record_id: String,
    pub record_id: String,
    pub record_name: String,
    pub record_type: String,
    pub record_version: String,
    pub origin: String,
    pub connector: String,
    pub block_num: Vec<i64>,
    pub block_text: String,
    pub block_type: String,
    pub departments: Vec<String>,
    pub topics: Vec<String>,
    pub categories: Vec<String>,
    pub subcategory_level1: Vec<String>,
    pub subcategory_level2: Vec<String>,
    pub subcategory_level3: Vec<String>,
    pub languages: Vec<String>,
    pub extension: String,
    pub mime_type: String,
    /// Raw free-text aircraft mention, possibly empty.
    pub aircraft: String,
    /// Canonical aircraft code, `"unknown"` when normalization fails.
    #[serde(rename = "aircraft_canonical")]
    pub aircraft_canonical: String,
    #[serde(rename = "aircraft_aliases")]
    pub aircraft_aliases: Vec<String>,
    #[serde(rename = "bounding_box", skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_num: Option<i64>,
    #[serde(rename = "confidence_score", skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl EnhancedMetadata {
    /// Serialize into the open map form used for merging and storage.
    pub fn into_map(self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
