//! Similarity check handler
//!
//! Handles POST /check requests that estimate whether an image is AI-generated
//! from its nearest judged neighbours.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use quip_core::{Classification, QueryOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{resolve_digests, validate_top_k};

const NOT_FOUND_MESSAGE: &str = "Insufficient training data: no comparable observations stored";

/// Request for a similarity check.
#[derive(Deserialize, ToSchema)]
pub struct CheckRequest {
    /// Map of hash type name to hex or base64 digest (an optional `hex:` or
    /// `b64:` prefix selects the encoding).
    /// Either `digests` or `image_data` must be provided.
    #[serde(default)]
    #[schema(example = json!({"mean": "f0f0f0f0f0f0f0f1"}))]
    pub digests: Option<BTreeMap<String, String>>,

    /// Base64-encoded image to compute digests from.
    #[serde(default)]
    pub image_data: Option<String>,

    /// Exact-content fingerprint used as the cache key.
    #[serde(default)]
    pub content_fingerprint: Option<String>,

    /// Number of neighbours to average over (default: server setting, max 100).
    #[serde(default)]
    #[schema(example = 5)]
    pub k: Option<usize>,
}

/// Response for a similarity check.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    /// Whether the answer came from the exact-match cache.
    pub cached: bool,
    /// Whether any stored record was comparable with the query.
    pub found: bool,
    /// Whether `p_yes` exceeds the likelihood threshold.
    pub likely_ai: bool,
    /// Estimated probability that the image is AI-generated.
    #[schema(example = 0.85)]
    pub p_yes: Option<f64>,
    /// `1 - p_yes`.
    #[schema(example = 0.15)]
    pub p_no: Option<f64>,
    /// Number of neighbours the estimate averaged over.
    pub n_matches: usize,
    /// Weighted distance of the closest neighbour (0 = exact match).
    pub best_score: Option<f64>,
    /// Explanation when no estimate could be made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl CheckResponse {
    fn classified(c: &Classification, cached: bool) -> Self {
        Self {
            cached,
            found: true,
            likely_ai: c.likely,
            p_yes: Some(c.p_yes),
            p_no: Some(c.p_no),
            n_matches: c.n_matches,
            best_score: Some(c.best_score),
            message: None,
        }
    }

    fn not_found() -> Self {
        Self {
            cached: false,
            found: false,
            likely_ai: false,
            p_yes: None,
            p_no: None,
            n_matches: 0,
            best_score: None,
            message: Some(NOT_FOUND_MESSAGE),
        }
    }
}

/// Check an image against stored observations.
///
/// The exact-match cache is consulted first, keyed by content fingerprint
/// (or by the full digest set when no fingerprint is known) and answering
/// only for the same `k`. On a miss the
/// engine ranks stored records by trust-weighted Hamming distance and
/// averages the AI likelihood of the `k` nearest.
///
/// An empty store is not an error: the response has `found: false`.
#[utoipa::path(
    post,
    path = "/check",
    tag = "Similarity",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Classification result", body = CheckResponse),
        (status = 400, description = "Invalid digests, image data or k")
    )
)]
pub async fn check_handler(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let k = validate_top_k(request.k)?;
    let resolved = resolve_digests(
        &state.hasher,
        request.digests.as_ref(),
        request.image_data.as_deref(),
        request.content_fingerprint,
    )?;
    let cache_key = resolved.cache_key();

    if let Some(hit) = cache_key.as_deref().and_then(|key| state.cache.get(key, k)) {
        tracing::debug!(p_yes = hit.p_yes, "Exact cache hit");
        return Ok(Json(CheckResponse::classified(&hit, true)));
    }

    let response = match state.engine.query_similarity(&resolved.digests, k)? {
        QueryOutcome::Classified(c) => {
            if let Some(key) = cache_key {
                state.cache.insert(key, k, c);
            }
            CheckResponse::classified(&c, false)
        }
        QueryOutcome::NotFound => CheckResponse::not_found(),
    };

    Ok(Json(response))
}
