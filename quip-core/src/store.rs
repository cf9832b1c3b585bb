//! Append-only storage of judged hash records.
//!
//! Records are created from an [`Observation`] and never modified or removed
//! afterwards. The [`RecordStore`] trait hides whether the backing is an
//! in-memory arena or something durable; [`MemoryStore`] is the in-memory
//! implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::DigestSet;
use crate::error::{QuipError, Result};
use crate::hash_type::HashType;

/// Unique, monotonically assigned record identifier.
pub type RecordId = u64;

/// Input for a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Perceptual digests of the judged image
    pub digests: DigestSet,
    /// Exact-content key (e.g. SHA3-256 hex), used for dedup and audit only
    #[serde(default)]
    pub content_fingerprint: String,
    /// Label: `true` means AI-generated
    pub judgement: bool,
    /// Confidence in `judgement`, within [0, 1]
    pub probability: f64,
}

impl Observation {
    pub fn new(
        digests: DigestSet,
        content_fingerprint: impl Into<String>,
        judgement: bool,
        probability: f64,
    ) -> Self {
        Self {
            digests,
            content_fingerprint: content_fingerprint.into(),
            judgement,
            probability,
        }
    }

    /// Check the record invariants that do not depend on store contents.
    pub fn validate(&self) -> Result<()> {
        if self.digests.is_empty() {
            return Err(QuipError::validation(
                "Observation must carry at least one digest",
            ));
        }

        if let Some((hash_type, _)) = self.digests.iter().find(|(_, d)| d.is_empty()) {
            return Err(QuipError::validation(format!(
                "Digest for '{}' is empty",
                hash_type
            )));
        }

        if !(0.0..=1.0).contains(&self.probability) {
            return Err(QuipError::validation(format!(
                "probability must be within [0, 1], got {}",
                self.probability
            )));
        }

        Ok(())
    }
}

/// A stored, immutable judged observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashRecord {
    pub id: RecordId,
    pub digests: DigestSet,
    pub content_fingerprint: String,
    pub judgement: bool,
    pub probability: f64,
    pub created_at: DateTime<Utc>,
}

impl HashRecord {
    /// Likelihood that the recorded image is AI-generated.
    pub fn ai_likelihood(&self) -> f64 {
        if self.judgement {
            self.probability
        } else {
            1.0 - self.probability
        }
    }
}

/// Storage backend for hash records.
pub trait RecordStore: Send + Sync {
    /// Validate and append a record, returning its new id.
    ///
    /// Either the whole record becomes visible to later scans or nothing does.
    fn insert(&mut self, observation: Observation) -> Result<RecordId>;

    /// Every stored record, in insertion order.
    fn scan(&self) -> Result<Box<dyn Iterator<Item = &HashRecord> + '_>>;

    /// Digest length fixed for a hash type, if any record has used it.
    fn digest_len(&self, hash_type: HashType) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory append-only arena.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<HashRecord>,
    digest_lengths: BTreeMap<HashType, usize>,
    next_id: RecordId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&HashRecord> {
        // Ids are dense and start at 1.
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.records.get(index)
    }
}

impl RecordStore for MemoryStore {
    fn insert(&mut self, observation: Observation) -> Result<RecordId> {
        observation.validate()?;

        let mut new_lengths = Vec::new();
        for (&hash_type, digest) in &observation.digests {
            match self.digest_lengths.get(&hash_type) {
                Some(&expected) if expected != digest.len() => {
                    return Err(QuipError::DigestLengthMismatch {
                        hash_type,
                        expected,
                        actual: digest.len(),
                    });
                }
                Some(_) => {}
                None => new_lengths.push((hash_type, digest.len())),
            }
        }

        self.digest_lengths.extend(new_lengths);
        self.next_id += 1;
        let id = self.next_id;

        self.records.push(HashRecord {
            id,
            digests: observation.digests,
            content_fingerprint: observation.content_fingerprint,
            judgement: observation.judgement,
            probability: observation.probability,
            created_at: Utc::now(),
        });

        tracing::debug!(record_id = id, total = self.records.len(), "Stored hash record");

        Ok(id)
    }

    fn scan(&self) -> Result<Box<dyn Iterator<Item = &HashRecord> + '_>> {
        Ok(Box::new(self.records.iter()))
    }

    fn digest_len(&self, hash_type: HashType) -> Option<usize> {
        self.digest_lengths.get(&hash_type).copied()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;

    fn observation(bytes: &[u8], judgement: bool, probability: f64) -> Observation {
        let mut digests = DigestSet::new();
        digests.insert(HashType::Mean, Digest::from(bytes));
        Observation::new(digests, "fp", judgement, probability)
    }

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let mut store = MemoryStore::new();
        let a = store.insert(observation(&[0x00], true, 0.9)).unwrap();
        let b = store.insert(observation(&[0x01], false, 0.4)).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(2).unwrap().probability, 0.4);
        assert!(store.get(0).is_none());
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_insert_rejects_empty_digests() {
        let mut store = MemoryStore::new();
        let obs = Observation::new(DigestSet::new(), "fp", true, 0.5);
        assert!(store.insert(obs).unwrap_err().is_validation());
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_rejects_out_of_range_probability() {
        let mut store = MemoryStore::new();
        assert!(store.insert(observation(&[0x00], true, 1.01)).is_err());
        assert!(store.insert(observation(&[0x00], true, -0.1)).is_err());
        assert!(store.insert(observation(&[0x00], true, f64::NAN)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_accepts_probability_bounds() {
        let mut store = MemoryStore::new();
        assert!(store.insert(observation(&[0x00], true, 0.0)).is_ok());
        assert!(store.insert(observation(&[0x00], true, 1.0)).is_ok());
    }

    #[test]
    fn test_first_digest_fixes_length() {
        let mut store = MemoryStore::new();
        store.insert(observation(&[0x00, 0x00], true, 0.5)).unwrap();
        assert_eq!(store.digest_len(HashType::Mean), Some(2));
        assert_eq!(store.digest_len(HashType::Dct), None);

        let err = store.insert(observation(&[0x00], true, 0.5)).unwrap_err();
        assert!(matches!(
            err,
            QuipError::DigestLengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejected_insert_registers_no_lengths() {
        let mut store = MemoryStore::new();
        store.insert(observation(&[0x00, 0x00], true, 0.5)).unwrap();

        // Dct is new but Mean mismatches: neither may be committed.
        let mut digests = DigestSet::new();
        digests.insert(HashType::Mean, Digest::from(&[0x00][..]));
        digests.insert(HashType::Dct, Digest::from(&[0x00; 8][..]));
        assert!(store
            .insert(Observation::new(digests, "fp", true, 0.5))
            .is_err());
        assert_eq!(store.digest_len(HashType::Dct), None);
    }

    #[test]
    fn test_scan_is_restartable_and_ordered() {
        let mut store = MemoryStore::new();
        for i in 0..3u8 {
            store.insert(observation(&[i], true, 0.5)).unwrap();
        }
        let first: Vec<_> = store.scan().unwrap().map(|r| r.id).collect();
        let second: Vec<_> = store.scan().unwrap().map(|r| r.id).collect();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ai_likelihood() {
        let mut store = MemoryStore::new();
        store.insert(observation(&[0x00], true, 0.8)).unwrap();
        store.insert(observation(&[0x00], false, 0.6)).unwrap();
        assert!((store.get(1).unwrap().ai_likelihood() - 0.8).abs() < 1e-12);
        assert!((store.get(2).unwrap().ai_likelihood() - 0.4).abs() < 1e-12);
    }
}
