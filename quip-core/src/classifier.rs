//! Reduces a ranked neighbour list to a single AI-likelihood estimate.

use serde::Serialize;

use crate::config::DEFAULT_LIKELY_THRESHOLD;
use crate::ranker::RankedMatch;

/// Probability estimate for a queried image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    /// Estimated probability that the image is AI-generated
    pub p_yes: f64,
    /// `1 - p_yes`
    pub p_no: f64,
    /// Whether `p_yes` exceeds the configured threshold
    pub likely: bool,
    /// Number of ranked records the estimate was averaged over
    pub n_matches: usize,
    /// Weighted distance of the closest record
    pub best_score: f64,
}

/// Result of a similarity query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Classified(Classification),
    /// No stored record shares a hash type with the query. This signals
    /// insufficient training data, not a failure.
    NotFound,
}

impl QueryOutcome {
    pub fn classification(&self) -> Option<&Classification> {
        match self {
            Self::Classified(c) => Some(c),
            Self::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Uniform average of the neighbours' AI likelihoods.
///
/// Distances only decide which records take part; every selected record
/// counts the same.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    threshold: f64,
}

impl Classifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, ranked: &[RankedMatch]) -> QueryOutcome {
        if ranked.is_empty() {
            return QueryOutcome::NotFound;
        }

        let total: f64 = ranked.iter().map(|m| m.record.ai_likelihood()).sum();
        let p_yes = (total / ranked.len() as f64).clamp(0.0, 1.0);
        let best_score = ranked
            .iter()
            .map(|m| m.score)
            .fold(f64::INFINITY, f64::min);

        QueryOutcome::Classified(Classification {
            p_yes,
            p_no: 1.0 - p_yes,
            likely: p_yes > self.threshold,
            n_matches: ranked.len(),
            best_score,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_LIKELY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{Digest, DigestSet};
    use crate::hash_type::HashType;
    use crate::store::HashRecord;
    use chrono::Utc;

    fn ranked(id: u64, judgement: bool, probability: f64, score: f64) -> RankedMatch {
        let mut digests = DigestSet::new();
        digests.insert(HashType::Mean, Digest::new(vec![0x00]));
        RankedMatch {
            record: HashRecord {
                id,
                digests,
                content_fingerprint: String::new(),
                judgement,
                probability,
                created_at: Utc::now(),
            },
            score,
            matched_types: 1,
        }
    }

    #[test]
    fn test_empty_is_not_found() {
        assert_eq!(Classifier::default().classify(&[]), QueryOutcome::NotFound);
    }

    #[test]
    fn test_single_positive_record() {
        let outcome = Classifier::default().classify(&[ranked(1, true, 0.9, 0.0)]);
        let c = outcome.classification().unwrap();
        assert!((c.p_yes - 0.9).abs() < 1e-12);
        assert!((c.p_no - 0.1).abs() < 1e-12);
        assert!(c.likely);
        assert_eq!(c.n_matches, 1);
    }

    #[test]
    fn test_negative_judgement_inverts_probability() {
        let outcome = Classifier::default()
            .classify(&[ranked(1, true, 0.8, 0.0), ranked(2, false, 0.6, 0.0)]);
        let c = outcome.classification().unwrap();
        assert!((c.p_yes - 0.6).abs() < 1e-12);
        assert!(!c.likely);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let list = [
            ranked(1, true, 0.33, 1.0),
            ranked(2, false, 0.71, 2.0),
            ranked(3, true, 0.12, 3.5),
        ];
        let c = *Classifier::default().classify(&list).classification().unwrap();
        assert_eq!(c.p_yes + c.p_no, 1.0);
        assert_eq!(c.best_score, 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let classifier = Classifier::new(0.5);
        let at = *classifier
            .classify(&[ranked(1, true, 0.5, 0.0)])
            .classification()
            .unwrap();
        assert!(!at.likely);

        let above = *classifier
            .classify(&[ranked(1, true, 0.51, 0.0)])
            .classification()
            .unwrap();
        assert!(above.likely);
    }
}
