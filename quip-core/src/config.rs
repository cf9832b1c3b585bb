//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{QuipError, Result};
use crate::hash_type::HashType;

/// Default number of nearest records a query aggregates over.
pub const DEFAULT_TOP_K: usize = 5;

/// Default probability above which an image is reported as likely AI-generated.
pub const DEFAULT_LIKELY_THRESHOLD: f64 = 0.7;

/// Configuration fixed at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hash types the engine accepts and weighs.
    pub hash_types: Vec<HashType>,
    /// Retrieval width used when a caller does not pass one.
    pub top_k: usize,
    /// `p_yes` strictly above this marks a result as likely.
    pub likely_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_types: HashType::ALL.to_vec(),
            top_k: DEFAULT_TOP_K,
            likely_threshold: DEFAULT_LIKELY_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Configuration restricted to the given hash types, other fields default.
    pub fn with_hash_types(hash_types: impl IntoIterator<Item = HashType>) -> Self {
        Self {
            hash_types: hash_types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.hash_types.is_empty() {
            return Err(QuipError::validation(
                "At least one hash type must be configured",
            ));
        }

        for (i, hash_type) in self.hash_types.iter().enumerate() {
            if self.hash_types[..i].contains(hash_type) {
                return Err(QuipError::validation(format!(
                    "Hash type '{}' configured more than once",
                    hash_type
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.likely_threshold) {
            return Err(QuipError::validation(format!(
                "likely_threshold must be within [0, 1], got {}",
                self.likely_threshold
            )));
        }

        Ok(())
    }
}
