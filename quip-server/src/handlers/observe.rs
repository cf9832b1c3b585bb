//! Observation handler
//!
//! Handles POST /observations requests that store a judged image.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use quip_core::{Observation, RecordId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::resolve_digests;

/// Request for storing a judged observation.
#[derive(Deserialize, ToSchema)]
pub struct ObserveRequest {
    /// Map of hash type name to hex or base64 digest (an optional `hex:` or
    /// `b64:` prefix selects the encoding).
    /// Either `digests` or `image_data` must be provided.
    #[serde(default)]
    #[schema(example = json!({"mean": "f0f0f0f0f0f0f0f0", "dct": "0123456789abcdef"}))]
    pub digests: Option<BTreeMap<String, String>>,

    /// Base64-encoded image to compute digests from.
    #[serde(default)]
    #[schema(example = "/9j/4AAQSkZJRg...")]
    pub image_data: Option<String>,

    /// Exact-content fingerprint. Computed from `image_data` when omitted.
    #[serde(default)]
    pub content_fingerprint: Option<String>,

    /// Whether the image was judged AI-generated.
    #[schema(example = true)]
    pub judgement: bool,

    /// Confidence of the judgement, in [0, 1].
    #[schema(example = 0.92)]
    pub probability: f64,
}

/// Response for a stored observation.
#[derive(Serialize, ToSchema)]
pub struct ObserveResponse {
    /// Identifier assigned to the stored record.
    #[schema(example = 1)]
    pub id: RecordId,
}

/// Store a judged observation.
///
/// Digests for hash types the server is not configured with are rejected,
/// as are digests whose length differs from earlier records of that type.
/// Any cached classification for the same image is invalidated.
#[utoipa::path(
    post,
    path = "/observations",
    tag = "Observations",
    request_body = ObserveRequest,
    responses(
        (status = 201, description = "Observation stored", body = ObserveResponse),
        (status = 400, description = "Invalid digests, image data or probability")
    )
)]
pub async fn observe_handler(
    State(state): State<AppState>,
    Json(request): Json<ObserveRequest>,
) -> Result<(StatusCode, Json<ObserveResponse>), ApiError> {
    let resolved = resolve_digests(
        &state.hasher,
        request.digests.as_ref(),
        request.image_data.as_deref(),
        request.content_fingerprint,
    )?;
    let cache_key = resolved.cache_key();

    let observation = Observation::new(
        resolved.digests,
        resolved.content_fingerprint.unwrap_or_default(),
        request.judgement,
        request.probability,
    );
    let id = state.engine.submit_observation(observation)?;

    if let Some(key) = cache_key {
        if state.cache.invalidate(&key) {
            tracing::debug!(key = %key, "Invalidated cached classification");
        }
    }

    Ok((StatusCode::CREATED, Json(ObserveResponse { id })))
}
