//! Quip Core - weighted multi-hash similarity for judged images
//!
//! This crate stores previously judged images as sets of perceptual hash
//! digests and estimates, for a new image, how likely it is to be
//! AI-generated from its nearest stored neighbours.
//!
//! # Features
//!
//! - Several independent perceptual hash types per image (mean, gradient,
//!   double gradient, block, DCT)
//! - Trust-weighted Hamming distance ranking across hash types
//! - Online reweighting of hash types from prediction feedback
//! - A single lock around store and weights, so queries see consistent state
//! - Optional perceptual hash computation from image bytes (`perceptual-hash`)
//!
//! # Example
//!
//! ```
//! use quip_core::{Digest, DigestSet, EngineConfig, HashType, Observation, SimilarityEngine};
//!
//! # fn example() -> quip_core::Result<()> {
//! let engine = SimilarityEngine::in_memory(EngineConfig::default())?;
//!
//! let mut digests = DigestSet::new();
//! digests.insert(HashType::Mean, Digest::from_hex("00ff00ff00ff00ff")?);
//! engine.submit_observation(Observation::new(digests.clone(), "sha3:...", true, 0.9))?;
//!
//! let outcome = engine.query_similarity(&digests, None)?;
//! let result = outcome.classification().expect("one comparable record");
//! assert_eq!(result.n_matches, 1);
//! assert!((result.p_yes - 0.9).abs() < 1e-12);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod classifier;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod hash_type;
#[cfg(feature = "perceptual-hash")]
pub mod perceptual;
pub mod ranker;
pub mod store;
pub mod weights;

// Re-export main types for convenience
pub use classifier::{Classification, Classifier, QueryOutcome};
pub use config::{EngineConfig, DEFAULT_LIKELY_THRESHOLD, DEFAULT_TOP_K};
pub use digest::{hamming_distance, parse_digest_set, Digest, DigestSet};
pub use engine::SimilarityEngine;
pub use error::{QuipError, Result};
pub use feedback::{FeedbackUpdater, ParsedFeedback};
pub use hash_type::HashType;
pub use ranker::{RankedMatch, WeightedRanker};
pub use store::{HashRecord, MemoryStore, Observation, RecordId, RecordStore};
pub use weights::{
    Contributions, FeedbackOutcome, TrustCounter, TrustEntry, TrustWeights, WeightSnapshot,
};

// Perceptual hashing exports
#[cfg(feature = "perceptual-hash")]
pub use perceptual::{content_fingerprint, ImageFingerprint, PerceptualHasher};
