//! Per-hash-type trust weights learned from prediction feedback.
//!
//! Each configured [`HashType`] keeps two accumulators: how much it
//! contributed to correct predictions and how much to incorrect ones. The raw
//! weight of a type is its correct share, with an optimistic prior of `1.0`
//! for a type that has never received feedback. Normalized weights divide
//! each raw weight by the sum over all configured types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::hash_type::HashType;

/// Normalized trust weight per configured hash type.
pub type WeightSnapshot = BTreeMap<HashType, f64>;

/// Contribution magnitude per hash type reported with a feedback call.
pub type Contributions = BTreeMap<HashType, f64>;

/// Feedback accumulators for one hash type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrustCounter {
    pub correct: f64,
    pub incorrect: f64,
}

impl TrustCounter {
    /// `correct / (correct + incorrect)`, or `1.0` before any feedback.
    pub fn raw_weight(&self) -> f64 {
        // Halved so the denominator stays finite when both sides near f64::MAX.
        let (correct, incorrect) = (self.correct / 2.0, self.incorrect / 2.0);
        let total = correct + incorrect;
        if total > 0.0 {
            correct / total
        } else {
            1.0
        }
    }
}

/// How many entries of a feedback call were applied or skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackOutcome {
    pub applied: usize,
    pub skipped: usize,
}

/// Reporting view of one hash type's trust state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrustEntry {
    pub hash_type: HashType,
    pub correct: f64,
    pub incorrect: f64,
    pub raw_weight: f64,
    pub weight: f64,
}

/// Trust accumulators for a fixed set of hash types.
#[derive(Debug, Clone)]
pub struct TrustWeights {
    counters: BTreeMap<HashType, TrustCounter>,
}

impl TrustWeights {
    /// Zeroed accumulators for every given hash type.
    pub fn new(hash_types: impl IntoIterator<Item = HashType>) -> Self {
        Self {
            counters: hash_types
                .into_iter()
                .map(|t| (t, TrustCounter::default()))
                .collect(),
        }
    }

    pub fn hash_types(&self) -> impl Iterator<Item = HashType> + '_ {
        self.counters.keys().copied()
    }

    pub fn contains(&self, hash_type: HashType) -> bool {
        self.counters.contains_key(&hash_type)
    }

    pub fn counter(&self, hash_type: HashType) -> Option<TrustCounter> {
        self.counters.get(&hash_type).copied()
    }

    /// Normalized weights for every configured type.
    pub fn snapshot(&self) -> WeightSnapshot {
        let raw: Vec<(HashType, f64)> = self
            .counters
            .iter()
            .map(|(&t, c)| (t, c.raw_weight()))
            .collect();

        let total: f64 = raw.iter().map(|(_, w)| w).sum();
        let total = if total > 0.0 { total } else { 1.0 };

        raw.into_iter().map(|(t, w)| (t, w / total)).collect()
    }

    /// Accumulators, raw and normalized weights for every configured type.
    pub fn report(&self) -> Vec<TrustEntry> {
        let snapshot = self.snapshot();
        self.counters
            .iter()
            .map(|(&hash_type, counter)| TrustEntry {
                hash_type,
                correct: counter.correct,
                incorrect: counter.incorrect,
                raw_weight: counter.raw_weight(),
                weight: snapshot.get(&hash_type).copied().unwrap_or(0.0),
            })
            .collect()
    }

    /// Credit each contribution to the correct or incorrect accumulator.
    ///
    /// Entries with a negative or non-finite value, for a hash type that is
    /// not configured, or that would push an accumulator past `f64::MAX`,
    /// are skipped rather than failing the whole call.
    pub fn record_feedback(&mut self, contributions: &Contributions, correct: bool) -> FeedbackOutcome {
        let mut outcome = FeedbackOutcome::default();

        for (&hash_type, &value) in contributions {
            let counter = match self.counters.get_mut(&hash_type) {
                Some(counter) if value.is_finite() && value >= 0.0 => counter,
                _ => {
                    tracing::debug!(
                        hash_type = %hash_type,
                        value,
                        "Skipping feedback entry"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let total = if correct {
                &mut counter.correct
            } else {
                &mut counter.incorrect
            };
            let updated = *total + value;
            if !updated.is_finite() {
                tracing::warn!(
                    hash_type = %hash_type,
                    value,
                    "Skipping feedback entry that would overflow the accumulator"
                );
                outcome.skipped += 1;
                continue;
            }
            *total = updated;
            outcome.applied += 1;
        }

        outcome
    }
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self::new(HashType::ALL)
    }
}
