//! Metadata reconciliation.
//!
//! Normalizes the open per-segment metadata map into the fixed
//! [`EnhancedMetadata`] schema with explicit defaults, including canonical
//! aircraft tagging.

mod aircraft;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

pub use aircraft::{
    AircraftNormalizeError, AircraftNormalizer, StaticAircraftNormalizer, UNKNOWN_AIRCRAFT,
};

use doc_indexer_shared::EnhancedMetadata;

/// Reconciles raw segment metadata into [`EnhancedMetadata`].
///
/// Pure per-segment function. Missing categorical fields default to empty;
/// aircraft normalization failures are absorbed into the `"unknown"` tag.
/// This stage never raises.
pub struct MetadataReconciler {
    normalizer: Arc<dyn AircraftNormalizer>,
}

impl MetadataReconciler {
    pub fn new(normalizer: Arc<dyn AircraftNormalizer>) -> Self {
        Self { normalizer }
    }

    /// Build enhanced metadata for one segment.
    pub fn reconcile(&self, meta: &Map<String, Value>) -> EnhancedMetadata {
        // blockType occasionally arrives as a list; take the first entry.
        let block_type = match meta.get("blockType") {
            Some(Value::Array(items)) => items
                .first()
                .map(value_to_string)
                .unwrap_or_else(|| "text".to_string()),
            Some(value) => value_to_string(value),
            None => "text".to_string(),
        };

        let aircraft = get_string(meta, "aircraft");
        let (aircraft_canonical, aircraft_aliases) = match self.normalizer.normalize(&aircraft) {
            Ok((canonical, aliases)) if !canonical.is_empty() => (canonical, aliases),
            Ok(_) => (UNKNOWN_AIRCRAFT.to_string(), Vec::new()),
            Err(e) => {
                warn!(error = %e, aircraft = %aircraft, "Aircraft normalization failed, tagging unknown");
                (UNKNOWN_AIRCRAFT.to_string(), Vec::new())
            }
        };

        EnhancedMetadata {
            org_id: get_string(meta, "orgId"),
            virtual_record_id: get_string(meta, "virtualRecordId"),
            record_id: get_string(meta, "recordId"),
            record_name: get_string(meta, "recordName"),
            record_type: get_string(meta, "recordType"),
            record_version: get_string(meta, "version"),
            origin: get_string(meta, "origin"),
            connector: get_string(meta, "connectorName"),
            block_num: get_block_nums(meta),
            block_text: get_string(meta, "blockText"),
            block_type,
            departments: get_string_list(meta, "departments"),
            topics: get_string_list(meta, "topics"),
            categories: get_string_list(meta, "categories"),
            subcategory_level1: get_string_list(meta, "subcategoryLevel1"),
            subcategory_level2: get_string_list(meta, "subcategoryLevel2"),
            subcategory_level3: get_string_list(meta, "subcategoryLevel3"),
            languages: get_string_list(meta, "languages"),
            extension: get_string(meta, "extension"),
            mime_type: get_string(meta, "mimeType"),
            aircraft,
            aircraft_canonical,
            aircraft_aliases,
            bounding_box: meta.get("bounding_box").filter(|v| !v.is_null()).cloned(),
            sheet_name: meta
                .get("sheetName")
                .and_then(Value::as_str)
                .map(str::to_string),
            sheet_num: meta.get("sheetNum").and_then(Value::as_i64),
            page_num: meta.get("pageNum").and_then(Value::as_i64),
            confidence_score: meta.get("confidence_score").and_then(Value::as_f64),
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn get_string(meta: &Map<String, Value>, key: &str) -> String {
    meta.get(key)
        .filter(|v| !v.is_null())
        .map(value_to_string)
        .unwrap_or_default()
}

fn get_string_list(meta: &Map<String, Value>, key: &str) -> Vec<String> {
    match meta.get(key) {
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn get_block_nums(meta: &Map<String, Value>) -> Vec<i64> {
    match meta.get("blockNum") {
        Some(Value::Array(nums)) => nums.iter().filter_map(Value::as_i64).collect(),
        Some(num) => num.as_i64().map(|n| vec![n]).unwrap_or_else(|| vec![0]),
        None => vec![0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct BrokenNormalizer;

    impl AircraftNormalizer for BrokenNormalizer {
        fn normalize(&self, _raw: &str) -> Result<(String, Vec<String>), AircraftNormalizeError> {
            Err(AircraftNormalizeError("backend offline".to_string()))
        }
    }

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let reconciler = MetadataReconciler::new(Arc::new(StaticAircraftNormalizer));

        let enhanced = reconciler.reconcile(&meta(json!({
            "orgId": "org-1",
            "virtualRecordId": "v-1",
            "recordId": "r-1",
        })));

        assert_eq!(enhanced.org_id, "org-1");
        assert_eq!(enhanced.block_num, vec![0]);
        assert_eq!(enhanced.block_type, "text");
        assert!(enhanced.topics.is_empty());
        assert_eq!(enhanced.aircraft_canonical, UNKNOWN_AIRCRAFT);
    }

    #[test]
    fn test_block_type_list_takes_first() {
        let reconciler = MetadataReconciler::new(Arc::new(StaticAircraftNormalizer));

        let enhanced = reconciler.reconcile(&meta(json!({
            "blockType": ["table", "text"],
        })));

        assert_eq!(enhanced.block_type, "table");
    }

    #[test]
    fn test_aircraft_normalized() {
        let reconciler = MetadataReconciler::new(Arc::new(StaticAircraftNormalizer));

        let enhanced = reconciler.reconcile(&meta(json!({
            "aircraft": "Airbus A320neo",
        })));

        assert_eq!(enhanced.aircraft, "Airbus A320neo");
        assert_eq!(enhanced.aircraft_canonical, "A320");
        assert!(!enhanced.aircraft_aliases.is_empty());
    }

    #[test]
    fn test_normalizer_failure_absorbed_to_unknown() {
        let reconciler = MetadataReconciler::new(Arc::new(BrokenNormalizer));

        let enhanced = reconciler.reconcile(&meta(json!({
            "aircraft": "A320",
        })));

        assert_eq!(enhanced.aircraft_canonical, UNKNOWN_AIRCRAFT);
        assert!(enhanced.aircraft_aliases.is_empty());
    }

    #[test]
    fn test_optional_fields_pass_through() {
        let reconciler = MetadataReconciler::new(Arc::new(StaticAircraftNormalizer));

        let enhanced = reconciler.reconcile(&meta(json!({
            "sheetName": "Weights",
            "pageNum": 12,
            "bounding_box": [{"x": 1.0, "y": 2.0}],
            "confidence_score": 0.75,
        })));

        assert_eq!(enhanced.sheet_name.as_deref(), Some("Weights"));
        assert_eq!(enhanced.page_num, Some(12));
        assert!(enhanced.bounding_box.is_some());
        assert_eq!(enhanced.confidence_score, Some(0.75));
    }
}
