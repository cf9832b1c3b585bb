//! Weighted multi-hash ranking of stored records against a query.

use serde::Serialize;

use crate::digest::{hamming_distance, DigestSet};
use crate::error::{QuipError, Result};
use crate::store::{HashRecord, RecordStore};
use crate::weights::{TrustWeights, WeightSnapshot};

/// A stored record together with its weighted distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub record: HashRecord,
    /// Sum of `weight * hamming_distance` over matched hash types; lower is closer
    pub score: f64,
    /// Number of hash types present in both the record and the query
    pub matched_types: usize,
}

/// Scores records by trust-weighted Hamming distance.
///
/// Borrowing the store and the weights together means a ranking always sees
/// one consistent version of both.
pub struct WeightedRanker<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    weights: &'a TrustWeights,
}

impl<'a, S: RecordStore + ?Sized> WeightedRanker<'a, S> {
    pub fn new(store: &'a S, weights: &'a TrustWeights) -> Self {
        Self { store, weights }
    }

    /// The `k` records closest to `query`, closest first.
    ///
    /// Records sharing no hash type with the query are left out. Equal
    /// scores keep insertion order.
    pub fn rank(&self, query: &DigestSet, k: usize) -> Result<Vec<RankedMatch>> {
        self.check_query_lengths(query)?;

        let snapshot = self.weights.snapshot();
        let mut scored = Vec::new();

        for record in self.store.scan()? {
            if let Some((score, matched_types)) = score_record(record, query, &snapshot)? {
                scored.push((record, score, matched_types));
            }
        }

        // `sort_by` is stable, and scan yields insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        tracing::trace!(
            candidates = self.store.len(),
            returned = scored.len(),
            k,
            "Ranked records"
        );

        Ok(scored
            .into_iter()
            .map(|(record, score, matched_types)| RankedMatch {
                record: record.clone(),
                score,
                matched_types,
            })
            .collect())
    }

    fn check_query_lengths(&self, query: &DigestSet) -> Result<()> {
        for (&hash_type, digest) in query {
            if let Some(expected) = self.store.digest_len(hash_type) {
                if expected != digest.len() {
                    return Err(QuipError::DigestLengthMismatch {
                        hash_type,
                        expected,
                        actual: digest.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Weighted distance of one record, or `None` if no hash type matched.
fn score_record(
    record: &HashRecord,
    query: &DigestSet,
    weights: &WeightSnapshot,
) -> Result<Option<(f64, usize)>> {
    let mut score = 0.0;
    let mut matched = 0;

    for (hash_type, stored) in &record.digests {
        let (Some(wanted), Some(weight)) = (query.get(hash_type), weights.get(hash_type)) else {
            continue;
        };

        let distance = hamming_distance(stored.as_bytes(), wanted.as_bytes()).ok_or(
            QuipError::DigestLengthMismatch {
                hash_type: *hash_type,
                expected: stored.len(),
                actual: wanted.len(),
            },
        )?;

        score += weight * f64::from(distance);
        matched += 1;
    }

    Ok((matched > 0).then_some((score, matched)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::hash_type::HashType;
    use crate::store::{MemoryStore, Observation};
    use crate::weights::Contributions;

    fn digests(entries: &[(HashType, &[u8])]) -> DigestSet {
        entries
            .iter()
            .map(|(t, bytes)| (*t, Digest::from(*bytes)))
            .collect()
    }

    fn insert(store: &mut MemoryStore, entries: &[(HashType, &[u8])]) -> u64 {
        store
            .insert(Observation::new(digests(entries), "fp", true, 0.5))
            .unwrap()
    }

    #[test]
    fn test_exact_match_ranks_first_with_zero_score() {
        let mut store = MemoryStore::new();
        insert(&mut store, &[(HashType::Mean, &[0xFF])]);
        let exact = insert(&mut store, &[(HashType::Mean, &[0x0F])]);
        insert(&mut store, &[(HashType::Mean, &[0x0E])]);

        let weights = TrustWeights::default();
        let ranked = WeightedRanker::new(&store, &weights)
            .rank(&digests(&[(HashType::Mean, &[0x0F])]), 5)
            .unwrap();

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].record.id, exact);
        assert_eq!(ranked[0].score, 0.0);
        assert!(ranked[1].score > 0.0);
        assert!(ranked.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_score_is_weighted_sum() {
        let mut store = MemoryStore::new();
        insert(
            &mut store,
            &[(HashType::Mean, &[0x00]), (HashType::Dct, &[0x00])],
        );

        let weights = TrustWeights::new([HashType::Mean, HashType::Dct]);
        // Mean differs in 8 bits, Dct in 2; each weighs 0.5.
        let query = digests(&[(HashType::Mean, &[0xFF]), (HashType::Dct, &[0x03])]);
        let ranked = WeightedRanker::new(&store, &weights).rank(&query, 5).unwrap();

        assert_eq!(ranked[0].matched_types, 2);
        assert!((ranked[0].score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_records_without_shared_types_are_excluded() {
        let mut store = MemoryStore::new();
        insert(&mut store, &[(HashType::Block, &[0x00])]);
        let shared = insert(&mut store, &[(HashType::Mean, &[0x00])]);

        let weights = TrustWeights::default();
        let ranked = WeightedRanker::new(&store, &weights)
            .rank(&digests(&[(HashType::Mean, &[0x01])]), 5)
            .unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id, shared);
    }

    #[test]
    fn test_unconfigured_types_do_not_match() {
        let mut store = MemoryStore::new();
        insert(&mut store, &[(HashType::Block, &[0x00])]);

        let weights = TrustWeights::new([HashType::Mean]);
        let ranked = WeightedRanker::new(&store, &weights)
            .rank(&digests(&[(HashType::Block, &[0x00])]), 5)
            .unwrap();

        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order_and_truncate() {
        let mut store = MemoryStore::new();
        let ids: Vec<_> = (0..6)
            .map(|_| insert(&mut store, &[(HashType::Mean, &[0xAA])]))
            .collect();

        let weights = TrustWeights::default();
        let ranker = WeightedRanker::new(&store, &weights);
        let query = digests(&[(HashType::Mean, &[0xAB])]);

        let ranked = ranker.rank(&query, 4).unwrap();
        let ranked_ids: Vec<_> = ranked.iter().map(|m| m.record.id).collect();
        assert_eq!(ranked_ids, ids[..4]);

        assert_eq!(ranker.rank(&query, 4).unwrap(), ranked);
        assert!(ranker.rank(&query, 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_length_mismatch_fails_fast() {
        let mut store = MemoryStore::new();
        insert(&mut store, &[(HashType::Mean, &[0x00, 0x00])]);

        let weights = TrustWeights::default();
        let err = WeightedRanker::new(&store, &weights)
            .rank(&digests(&[(HashType::Mean, &[0x00])]), 5)
            .unwrap_err();

        assert!(matches!(
            err,
            QuipError::DigestLengthMismatch {
                hash_type: HashType::Mean,
                expected: 2,
                actual: 1,
            }
        ));
    }

    #[test]
    fn test_trust_shifts_ranking() {
        let mut store = MemoryStore::new();
        // Close on mean, far on dct.
        let near_mean = insert(
            &mut store,
            &[(HashType::Mean, &[0x00]), (HashType::Dct, &[0xFF])],
        );
        // Far on mean, close on dct.
        let near_dct = insert(
            &mut store,
            &[(HashType::Mean, &[0x3F]), (HashType::Dct, &[0x00])],
        );
        let query = digests(&[(HashType::Mean, &[0x00]), (HashType::Dct, &[0x00])]);

        let mut weights = TrustWeights::new([HashType::Mean, HashType::Dct]);
        let top = WeightedRanker::new(&store, &weights).rank(&query, 1).unwrap();
        assert_eq!(top[0].record.id, near_dct);

        let mut dct_wrong = Contributions::new();
        dct_wrong.insert(HashType::Dct, 10.0);
        weights.record_feedback(&dct_wrong, false);

        let top = WeightedRanker::new(&store, &weights).rank(&query, 1).unwrap();
        assert_eq!(top[0].record.id, near_mean);
    }
}
