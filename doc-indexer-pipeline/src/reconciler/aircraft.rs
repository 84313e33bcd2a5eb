//! Canonical aircraft tagging.
//!
//! Free-text aircraft mentions from document metadata are normalized to a
//! canonical code plus an alias list, used to scope retrieval. Normalization
//! failures never block ingestion; the reconciler absorbs them into the
//! `"unknown"` tag.

use thiserror::Error;

/// Canonical value for unrecognized or absent aircraft mentions.
pub const UNKNOWN_AIRCRAFT: &str = "unknown";

/// Error raised by a normalizer backend.
#[derive(Debug, Clone, Error)]
#[error("Aircraft normalization failed: {0}")]
pub struct AircraftNormalizeError(pub String);

/// Capability interface for aircraft normalization.
pub trait AircraftNormalizer: Send + Sync {
    /// Normalize a raw mention to `(canonical, aliases)`.
    ///
    /// Unrecognized input is not an error; it maps to
    /// [`UNKNOWN_AIRCRAFT`] with no aliases.
    fn normalize(&self, raw: &str) -> Result<(String, Vec<String>), AircraftNormalizeError>;
}

/// Table-driven normalizer covering the common fleet.
///
/// Matching is case-insensitive and ignores separators, so "A-320", "a320"
/// and "Airbus A320" all map to the same canonical code.
pub struct StaticAircraftNormalizer;

/// (canonical, match keys, aliases)
const AIRCRAFT_TABLE: &[(&str, &[&str], &[&str])] = &[
    ("A320", &["a320", "airbusa320"], &["A320", "Airbus A320", "A-320"]),
    ("A321", &["a321", "airbusa321"], &["A321", "Airbus A321", "A-321"]),
    ("A330", &["a330", "airbusa330"], &["A330", "Airbus A330", "A-330"]),
    ("A350", &["a350", "airbusa350"], &["A350", "Airbus A350", "A-350"]),
    ("B737", &["b737", "737", "boeing737"], &["B737", "Boeing 737", "737"]),
    ("B747", &["b747", "747", "boeing747"], &["B747", "Boeing 747", "747"]),
    ("B777", &["b777", "777", "boeing777"], &["B777", "Boeing 777", "777"]),
    ("B787", &["b787", "787", "boeing787"], &["B787", "Boeing 787", "787", "Dreamliner"]),
    ("ATR72", &["atr72", "atr-72"], &["ATR72", "ATR 72"]),
    ("E190", &["e190", "embraer190"], &["E190", "Embraer 190"]),
];

impl AircraftNormalizer for StaticAircraftNormalizer {
    fn normalize(&self, raw: &str) -> Result<(String, Vec<String>), AircraftNormalizeError> {
        let compact: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if compact.is_empty() {
            return Ok((UNKNOWN_AIRCRAFT.to_string(), Vec::new()));
        }

        for (canonical, keys, aliases) in AIRCRAFT_TABLE {
            if keys.iter().any(|key| compact.contains(key)) {
                return Ok((
                    canonical.to_string(),
                    aliases.iter().map(|a| a.to_string()).collect(),
                ));
            }
        }

        Ok((UNKNOWN_AIRCRAFT.to_string(), Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_variants() {
        let normalizer = StaticAircraftNormalizer;

        let (canonical, aliases) = normalizer.normalize("Airbus A-320 FCOM").unwrap();
        assert_eq!(canonical, "A320");
        assert!(aliases.contains(&"Airbus A320".to_string()));

        let (canonical, _) = normalizer.normalize("boeing 787-9").unwrap();
        assert_eq!(canonical, "B787");
    }

    #[test]
    fn test_unrecognized_maps_to_unknown() {
        let normalizer = StaticAircraftNormalizer;

        let (canonical, aliases) = normalizer.normalize("concorde").unwrap();
        assert_eq!(canonical, UNKNOWN_AIRCRAFT);
        assert!(aliases.is_empty());

        let (canonical, _) = normalizer.normalize("").unwrap();
        assert_eq!(canonical, UNKNOWN_AIRCRAFT);
    }
}
