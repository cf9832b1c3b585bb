//! Trust weight handler
//!
//! Handles GET /weights requests reporting the current per-hash-type trust state.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

/// Trust state of one hash type.
#[derive(Serialize, ToSchema)]
pub struct WeightEntry {
    #[schema(example = "dct")]
    pub hash_type: String,
    /// Feedback mass from correct predictions.
    pub correct: f64,
    /// Feedback mass from incorrect predictions.
    pub incorrect: f64,
    /// `correct / (correct + incorrect)`, or 1.0 before any feedback.
    pub raw_weight: f64,
    /// Raw weight normalized so that all weights sum to 1.
    #[schema(example = 0.2)]
    pub weight: f64,
}

/// Response listing all configured hash types.
#[derive(Serialize, ToSchema)]
pub struct WeightsResponse {
    pub weights: Vec<WeightEntry>,
}

/// Current trust weights.
#[utoipa::path(
    get,
    path = "/weights",
    tag = "Feedback",
    responses(
        (status = 200, description = "Trust weights per hash type", body = WeightsResponse)
    )
)]
pub async fn weights_handler(
    State(state): State<AppState>,
) -> Result<Json<WeightsResponse>, ApiError> {
    let weights = state
        .engine
        .trust_report()?
        .into_iter()
        .map(|entry| WeightEntry {
            hash_type: entry.hash_type.to_string(),
            correct: entry.correct,
            incorrect: entry.incorrect,
            raw_weight: entry.raw_weight,
            weight: entry.weight,
        })
        .collect();

    Ok(Json(WeightsResponse { weights }))
}
