//! The similarity engine: store, trust weights, ranking, and feedback behind
//! a single lock.
//!
//! Queries hold the shared side of the lock while they take the weight
//! snapshot, scan the store, and rank, so a query never mixes weights from
//! one version with records from another. Inserts and feedback take the
//! exclusive side.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, info};

use crate::classifier::{Classifier, QueryOutcome};
use crate::config::EngineConfig;
use crate::digest::DigestSet;
use crate::error::{QuipError, Result};
use crate::feedback::FeedbackUpdater;
use crate::hash_type::HashType;
use crate::ranker::WeightedRanker;
use crate::store::{MemoryStore, Observation, RecordId, RecordStore};
use crate::weights::{Contributions, FeedbackOutcome, TrustEntry, TrustWeights, WeightSnapshot};

struct EngineState<S> {
    store: S,
    weights: TrustWeights,
}

/// Thread-safe facade over the record store and trust weights.
pub struct SimilarityEngine<S: RecordStore = MemoryStore> {
    config: EngineConfig,
    classifier: Classifier,
    feedback: FeedbackUpdater,
    state: RwLock<EngineState<S>>,
}

impl SimilarityEngine<MemoryStore> {
    /// Engine with an empty in-memory store.
    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        Self::with_store(config, MemoryStore::new())
    }
}

impl<S: RecordStore> SimilarityEngine<S> {
    pub fn with_store(config: EngineConfig, store: S) -> Result<Self> {
        config.validate()?;

        info!(
            hash_types = ?config.hash_types,
            top_k = config.top_k,
            likely_threshold = config.likely_threshold,
            "Similarity engine initialized"
        );

        Ok(Self {
            classifier: Classifier::new(config.likely_threshold),
            feedback: FeedbackUpdater::new(),
            state: RwLock::new(EngineState {
                store,
                weights: TrustWeights::new(config.hash_types.iter().copied()),
            }),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store a judged observation.
    pub fn submit_observation(&self, observation: Observation) -> Result<RecordId> {
        self.check_configured(&observation.digests)?;
        observation.validate()?;

        let judgement = observation.judgement;
        let id = self.write()?.store.insert(observation)?;

        info!(record_id = id, judgement, "Observation stored");
        Ok(id)
    }

    /// Classify a query against its `k` nearest stored records.
    ///
    /// `k` of `None` uses the configured default.
    pub fn query_similarity(&self, digests: &DigestSet, k: Option<usize>) -> Result<QueryOutcome> {
        if digests.is_empty() {
            return Err(QuipError::validation("Query must carry at least one digest"));
        }
        self.check_configured(digests)?;

        let k = k.unwrap_or(self.config.top_k);
        let ranked = {
            let state = self.read()?;
            WeightedRanker::new(&state.store, &state.weights).rank(digests, k)?
        };

        let outcome = self.classifier.classify(&ranked);
        match &outcome {
            QueryOutcome::Classified(c) => debug!(
                n_matches = c.n_matches,
                p_yes = c.p_yes,
                likely = c.likely,
                "Query classified"
            ),
            QueryOutcome::NotFound => debug!("Query found no comparable records"),
        }

        Ok(outcome)
    }

    /// Apply a loosely-typed feedback payload.
    pub fn submit_feedback(&self, payload: &Value) -> Result<FeedbackOutcome> {
        let parsed = self.feedback.parse(payload)?;
        let mut outcome = self.record_feedback(&parsed.contributions, parsed.correct)?;
        outcome.skipped += parsed.skipped;
        Ok(outcome)
    }

    /// Apply already-typed feedback.
    pub fn record_feedback(
        &self,
        contributions: &Contributions,
        correct: bool,
    ) -> Result<FeedbackOutcome> {
        let outcome = self.write()?.weights.record_feedback(contributions, correct);

        info!(
            correct,
            applied = outcome.applied,
            skipped = outcome.skipped,
            "Feedback recorded"
        );
        Ok(outcome)
    }

    /// Current normalized trust weights.
    pub fn weights(&self) -> Result<WeightSnapshot> {
        Ok(self.read()?.weights.snapshot())
    }

    /// Accumulators and weights per configured hash type.
    pub fn trust_report(&self) -> Result<Vec<TrustEntry>> {
        Ok(self.read()?.weights.report())
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.read()?.store.len())
    }

    fn check_configured(&self, digests: &DigestSet) -> Result<()> {
        let unknown: Vec<HashType> = digests
            .keys()
            .copied()
            .filter(|t| !self.config.hash_types.contains(t))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(QuipError::validation(format!(
                "Hash types not configured: {:?}",
                unknown.iter().map(HashType::as_str).collect::<Vec<_>>()
            )))
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EngineState<S>>> {
        self.state
            .read()
            .map_err(|_| QuipError::storage("Engine state lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EngineState<S>>> {
        self.state
            .write()
            .map_err(|_| QuipError::storage("Engine state lock poisoned"))
    }
}

impl<S: RecordStore> std::fmt::Debug for SimilarityEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("config", &self.config)
            .field("records", &self.record_count().unwrap_or(0))
            .finish()
    }
}
