//! Document segment and chunk types.
//!
//! A [`Segment`] is the smallest parsed unit of document text produced by the
//! upstream parser. Segments are merged into [`Chunk`]s, which are the unit of
//! embedding and storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while converting raw segment data into typed form.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// A bounding box value was not a well-formed list of `{x, y}` points.
    #[error("Malformed bounding box: {0}")]
    MalformedBoundingBox(String),
}

/// A single corner of a bounding quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxPoint {
    pub x: f64,
    pub y: f64,
}

impl BoxPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse a metadata value into a list of points.
    ///
    /// Accepts only a non-empty JSON array of objects carrying numeric `x`
    /// and `y` fields. Anything else fails loudly rather than producing a
    /// silently wrong box downstream.
    pub fn parse_list(value: &Value) -> Result<Vec<BoxPoint>, DocumentError> {
        let points = value.as_array().ok_or_else(|| {
            DocumentError::MalformedBoundingBox(format!("expected array, got {}", value))
        })?;

        if points.is_empty() {
            return Err(DocumentError::MalformedBoundingBox(
                "empty point list".to_string(),
            ));
        }

        points
            .iter()
            .map(|point| {
                let x = point.get("x").and_then(Value::as_f64);
                let y = point.get("y").and_then(Value::as_f64);
                match (x, y) {
                    (Some(x), Some(y)) => Ok(BoxPoint::new(x, y)),
                    _ => Err(DocumentError::MalformedBoundingBox(format!(
                        "point missing numeric x/y: {}",
                        point
                    ))),
                }
            })
            .collect()
    }
}

/// Immutable pipeline input: raw text plus open metadata from the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Segment {
    pub fn new(text: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Merged unit of document text and reconciled metadata; the unit of
/// embedding and storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Space-joined text of the member segments.
    pub content: String,
    /// Merged metadata of the member segments.
    pub metadata: Map<String, Value>,
    /// Enclosing quadrilateral over all member bounding boxes, if any.
    pub bounding_box: Option<Vec<BoxPoint>>,
    /// Sorted, deduplicated block numbers of the member segments.
    pub block_numbers: Vec<i64>,
}

impl Chunk {
    /// Build a chunk from a single segment, lifting `bounding_box` and
    /// `blockNum` out of the metadata map into the typed fields.
    ///
    /// A present-but-malformed bounding box is an error; the caller decides
    /// whether that aborts the run.
    pub fn from_segment(segment: Segment) -> Result<Self, DocumentError> {
        let mut metadata = segment.metadata;

        let bounding_box = match metadata.remove("bounding_box") {
            Some(Value::Null) | None => None,
            Some(value) => Some(BoxPoint::parse_list(&value)?),
        };

        let block_numbers = match metadata.remove("blockNum") {
            Some(Value::Array(nums)) => {
                let mut out: Vec<i64> = nums.iter().filter_map(Value::as_i64).collect();
                out.sort_unstable();
                out.dedup();
                out
            }
            Some(num) => num.as_i64().map(|n| vec![n]).unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(Self {
            content: segment.text,
            metadata,
            bounding_box,
            block_numbers,
        })
    }

    /// Flatten the chunk back into a storage payload: the metadata map with
    /// the typed bounding box and block numbers folded back in.
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = self.metadata.clone();
        payload.insert(
            "blockNum".to_string(),
            Value::Array(self.block_numbers.iter().map(|n| Value::from(*n)).collect()),
        );
        if let Some(ref points) = self.bounding_box {
            payload.insert(
                "bounding_box".to_string(),
                serde_json::to_value(points).unwrap_or(Value::Null),
            );
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_segment_lifts_typed_fields() {
        let segment = Segment::new(
            "hello",
            meta(json!({
                "blockNum": [3, 1, 3],
                "bounding_box": [{"x": 1.0, "y": 2.0}, {"x": 4.0, "y": 6.0}],
                "orgId": "org-1",
            })),
        );

        let chunk = Chunk::from_segment(segment).unwrap();

        assert_eq!(chunk.content, "hello");
        assert_eq!(chunk.block_numbers, vec![1, 3]);
        assert_eq!(
            chunk.bounding_box,
            Some(vec![BoxPoint::new(1.0, 2.0), BoxPoint::new(4.0, 6.0)])
        );
        assert!(!chunk.metadata.contains_key("bounding_box"));
        assert_eq!(chunk.metadata["orgId"], json!("org-1"));
    }

    #[test]
    fn test_from_segment_scalar_block_num() {
        let segment = Segment::new("x", meta(json!({"blockNum": 7})));
        let chunk = Chunk::from_segment(segment).unwrap();
        assert_eq!(chunk.block_numbers, vec![7]);
    }

    #[test]
    fn test_malformed_bounding_box_fails() {
        let segment = Segment::new("x", meta(json!({"bounding_box": [{"x": 1.0}]})));
        assert!(matches!(
            Chunk::from_segment(segment),
            Err(DocumentError::MalformedBoundingBox(_))
        ));

        let segment = Segment::new("x", meta(json!({"bounding_box": "nope"})));
        assert!(Chunk::from_segment(segment).is_err());
    }

    #[test]
    fn test_payload_round_trip() {
        let segment = Segment::new(
            "x",
            meta(json!({
                "blockNum": [2],
                "bounding_box": [{"x": 0.0, "y": 0.0}],
                "topics": ["a"],
            })),
        );
        let chunk = Chunk::from_segment(segment).unwrap();
        let payload = chunk.payload();

        assert_eq!(payload["blockNum"], json!([2]));
        assert_eq!(payload["bounding_box"], json!([{"x": 0.0, "y": 0.0}]));
        assert_eq!(payload["topics"], json!(["a"]));
    }
}
