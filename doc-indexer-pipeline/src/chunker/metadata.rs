//! Merge rules for chunk metadata and bounding boxes.

use serde_json::{Map, Value};

use crate::errors::IndexingError;
use doc_indexer_shared::{BoxPoint, Chunk};

/// Merge metadata maps from multiple chunks.
///
/// For each field:
/// - list values are flattened and deduplicated by string form, first-seen
///   order preserved
/// - `confidence_score` takes the maximum across members
/// - identical scalar values collapse to one; differing scalars become a
///   deduplicated list
///
/// `null` values are treated as absent.
pub fn merge_metadata(metadata_list: &[Map<String, Value>]) -> Map<String, Value> {
    let mut merged = Map::new();
    if metadata_list.is_empty() {
        return merged;
    }

    // Union of keys in first-seen order so output field order is stable.
    let mut fields: Vec<&String> = Vec::new();
    for meta in metadata_list {
        for key in meta.keys() {
            if !fields.contains(&key) {
                fields.push(key);
            }
        }
    }

    for field in fields {
        let values: Vec<&Value> = metadata_list
            .iter()
            .filter_map(|meta| meta.get(field))
            .filter(|v| !v.is_null())
            .collect();

        if values.is_empty() {
            continue;
        }

        if values[0].is_array() {
            let mut unique = Vec::new();
            let mut seen = Vec::new();
            for value in &values {
                if let Some(items) = value.as_array() {
                    for item in items {
                        let key = item.to_string();
                        if !seen.contains(&key) {
                            seen.push(key);
                            unique.push(item.clone());
                        }
                    }
                }
            }
            merged.insert(field.clone(), Value::Array(unique));
        } else if field == "confidence_score" {
            let max = values
                .iter()
                .filter_map(|v| v.as_f64())
                .fold(f64::NEG_INFINITY, f64::max);
            if max.is_finite() {
                merged.insert(field.clone(), Value::from(max));
            } else {
                merged.insert(field.clone(), values[0].clone());
            }
        } else {
            let str_values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            let all_same = str_values.iter().all(|s| s == &str_values[0]);

            if all_same {
                merged.insert(field.clone(), values[0].clone());
            } else {
                let mut unique = Vec::new();
                let mut seen = Vec::new();
                for (value, key) in values.iter().zip(str_values) {
                    if !seen.contains(&key) {
                        seen.push(key);
                        unique.push((*value).clone());
                    }
                }
                merged.insert(field.clone(), Value::Array(unique));
            }
        }
    }

    merged
}

/// Merge multiple bounding boxes into one enclosing quadrilateral.
///
/// The result's corners are (min x, min y), (max x, min y), (max x, max y),
/// (min x, max y) over all member points. An empty member point list is
/// malformed input and fails loudly.
pub fn merge_bounding_boxes(boxes: &[&Vec<BoxPoint>]) -> Result<Vec<BoxPoint>, IndexingError> {
    if boxes.is_empty() {
        return Err(IndexingError::metadata("no bounding boxes to merge"));
    }
    if boxes.iter().any(|b| b.is_empty()) {
        return Err(IndexingError::metadata(
            "bounding box with empty point list",
        ));
    }

    let points = boxes.iter().flat_map(|b| b.iter());
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Ok(vec![
        BoxPoint::new(min_x, min_y),
        BoxPoint::new(max_x, min_y),
        BoxPoint::new(max_x, max_y),
        BoxPoint::new(min_x, max_y),
    ])
}

/// Merge a group of chunks into one.
///
/// Concatenates text with spaces, merges metadata by the rules above, unions
/// block numbers into a sorted set, and unions bounding boxes when any
/// member has one.
pub fn merge_chunks(group: &[Chunk]) -> Result<Chunk, IndexingError> {
    if group.is_empty() {
        return Err(IndexingError::chunking("cannot merge an empty group"));
    }

    let content = group
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let metadata_list: Vec<Map<String, Value>> =
        group.iter().map(|c| c.metadata.clone()).collect();
    let metadata = merge_metadata(&metadata_list);

    let mut block_numbers: Vec<i64> = group
        .iter()
        .flat_map(|c| c.block_numbers.iter().copied())
        .collect();
    block_numbers.sort_unstable();
    block_numbers.dedup();

    let boxes: Vec<&Vec<BoxPoint>> = group.iter().filter_map(|c| c.bounding_box.as_ref()).collect();
    let bounding_box = if boxes.is_empty() {
        None
    } else {
        Some(merge_bounding_boxes(&boxes)?)
    };

    Ok(Chunk {
        content,
        metadata,
        bounding_box,
        block_numbers,
    })
}
