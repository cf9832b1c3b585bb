//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use quip_core::{PerceptualHasher, SimilarityEngine};

use crate::cache::ExactCache;
use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Similarity engine holding records and trust weights
    pub engine: Arc<SimilarityEngine>,
    /// Exact-match cache consulted before the engine
    pub cache: Arc<ExactCache>,
    /// Hasher for requests that send raw image bytes
    pub hasher: Arc<PerceptualHasher>,
}

impl AppState {
    /// Build the state from server configuration.
    pub fn from_config(config: &Config) -> quip_core::Result<Self> {
        let engine = SimilarityEngine::in_memory(config.engine.clone())?;
        let hasher = PerceptualHasher::new(config.engine.hash_types.iter().copied());
        let cache = ExactCache::new(config.cache_max_entries, config.cache_ttl());

        Ok(Self {
            engine: Arc::new(engine),
            cache: Arc::new(cache),
            hasher: Arc::new(hasher),
        })
    }
}
