//! Parsing of loosely-typed feedback payloads.
//!
//! Clients report, for a past prediction, how much each hash type
//! contributed and whether the prediction turned out correct. The payload
//! shape is checked strictly; individual entries are checked leniently, so
//! one bad entry does not discard an otherwise good batch.

use serde_json::Value;

use crate::error::{QuipError, Result};
use crate::hash_type::HashType;
use crate::weights::Contributions;

/// A feedback payload after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeedback {
    pub contributions: Contributions,
    pub correct: bool,
    /// Entries dropped while parsing (unknown type, non-numeric, negative or
    /// non-finite value)
    pub skipped: usize,
}

/// Validates feedback payloads before they reach the trust weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackUpdater;

impl FeedbackUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Parse a `{"contributions": {...}, "correct": ...}` document.
    pub fn parse(&self, payload: &Value) -> Result<ParsedFeedback> {
        let object = payload
            .as_object()
            .ok_or_else(|| QuipError::validation("Feedback payload must be a JSON object"))?;

        let contributions = object
            .get("contributions")
            .ok_or_else(|| QuipError::validation("Missing 'contributions' field"))?;
        let correct = object
            .get("correct")
            .ok_or_else(|| QuipError::validation("Missing 'correct' field"))?;

        self.parse_parts(contributions, correct)
    }

    /// Parse the contributions mapping and correctness flag separately.
    pub fn parse_parts(&self, contributions: &Value, correct: &Value) -> Result<ParsedFeedback> {
        let entries = contributions
            .as_object()
            .ok_or_else(|| QuipError::validation("'contributions' must be a JSON object"))?;
        let correct = coerce_bool(correct)?;

        let mut parsed = Contributions::new();
        let mut skipped = 0;

        for (name, value) in entries {
            match (name.parse::<HashType>(), value.as_f64()) {
                (Ok(hash_type), Some(number)) if number.is_finite() && number >= 0.0 => {
                    // Repeated names after case folding accumulate once each
                    // entry has been checked on its own.
                    let merged = parsed.get(&hash_type).copied().unwrap_or(0.0) + number;
                    if merged.is_finite() {
                        parsed.insert(hash_type, merged);
                    } else {
                        tracing::debug!(name = %name, value = %value, "Skipping overflowing feedback entry");
                        skipped += 1;
                    }
                }
                _ => {
                    tracing::debug!(name = %name, value = %value, "Skipping feedback entry");
                    skipped += 1;
                }
            }
        }

        Ok(ParsedFeedback {
            contributions: parsed,
            correct,
            skipped,
        })
    }
}

/// Accept booleans, `0`/`1`, and common textual spellings.
fn coerce_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Ok(true),
            Some(x) if x == 0.0 => Ok(false),
            _ => Err(QuipError::validation(format!(
                "'correct' must be boolean, got {}",
                n
            ))),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(QuipError::validation(format!(
                "'correct' must be boolean, got '{}'",
                s
            ))),
        },
        other => Err(QuipError::validation(format!(
            "'correct' must be boolean, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_well_formed() {
        let parsed = FeedbackUpdater::new()
            .parse(&json!({"contributions": {"mean": 2.0, "dct": 0.5}, "correct": true}))
            .unwrap();
        assert!(parsed.correct);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.contributions[&HashType::Mean], 2.0);
        assert_eq!(parsed.contributions[&HashType::Dct], 0.5);
    }

    #[test]
    fn test_bad_entries_are_skipped_not_fatal() {
        let parsed = FeedbackUpdater::new()
            .parse(&json!({
                "contributions": {"mean": 1, "sha256": 1.0, "block": "lots", "dct": null},
                "correct": false
            }))
            .unwrap();
        assert!(!parsed.correct);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.contributions.len(), 1);
        assert_eq!(parsed.contributions[&HashType::Mean], 1.0);
    }

    #[test]
    fn test_negative_values_are_skipped() {
        let parsed = FeedbackUpdater::new()
            .parse(&json!({"contributions": {"gradient": -3.0}, "correct": true}))
            .unwrap();
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.contributions.is_empty());
    }

    #[test]
    fn test_case_folded_duplicates_checked_individually() {
        let parsed = FeedbackUpdater::new()
            .parse(&json!({"contributions": {"mean": 1.0, "MEAN": -5.0}, "correct": true}))
            .unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.contributions[&HashType::Mean], 1.0);

        let parsed = FeedbackUpdater::new()
            .parse(&json!({"contributions": {"dct": 0.5, "DCT": 0.25}, "correct": false}))
            .unwrap();
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.contributions[&HashType::Dct], 0.75);
    }

    #[test]
    fn test_rejects_malformed_shape() {
        let updater = FeedbackUpdater::new();
        assert!(updater.parse(&json!([1, 2, 3])).is_err());
        assert!(updater.parse(&json!({"correct": true})).is_err());
        assert!(updater
            .parse(&json!({"contributions": [1.0], "correct": true}))
            .is_err());
        assert!(updater
            .parse(&json!({"contributions": {"mean": 1.0}}))
            .is_err());
    }

    #[test]
    fn test_correct_coercion() {
        let updater = FeedbackUpdater::new();
        let contributions = json!({});
        for (value, expected) in [
            (json!(true), true),
            (json!(0), false),
            (json!(1), true),
            (json!("YES"), true),
            (json!("false"), false),
            (json!(" 0 "), false),
        ] {
            let parsed = updater.parse_parts(&contributions, &value).unwrap();
            assert_eq!(parsed.correct, expected, "value {}", value);
        }

        for value in [json!(2), json!("maybe"), json!(null), json!({"a": 1})] {
            let err = updater.parse_parts(&contributions, &value).unwrap_err();
            assert!(err.is_validation());
        }
    }
}
