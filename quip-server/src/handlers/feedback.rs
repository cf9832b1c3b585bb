//! Feedback handler
//!
//! Handles POST /feedback requests that adjust per-hash-type trust weights.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

/// Shape of a feedback request, for documentation.
///
/// The handler reads the body as loose JSON so malformed entries can be
/// skipped instead of rejecting the whole request.
#[derive(ToSchema)]
pub struct FeedbackRequest {
    /// Map of hash type name to non-negative contribution.
    #[schema(value_type = Object, example = json!({"mean": 1.0, "dct": 0.5}))]
    pub contributions: Value,
    /// Whether the prediction was correct.
    #[schema(value_type = bool, example = true)]
    pub correct: Value,
}

/// Response for applied feedback.
#[derive(Serialize, ToSchema)]
pub struct FeedbackResponse {
    /// Number of contribution entries credited to a hash type.
    #[schema(example = 2)]
    pub applied: usize,
    /// Number of entries ignored (unknown type, non-numeric or negative).
    #[schema(example = 0)]
    pub skipped: usize,
}

/// Report whether an earlier prediction was correct.
///
/// Body: `{"contributions": {"<hash type>": <number>, ...}, "correct": <bool>}`.
/// `correct` also accepts `0`/`1` and the strings "true", "false", "yes",
/// "no". Malformed contribution entries are skipped and counted rather
/// than failing the request.
#[utoipa::path(
    post,
    path = "/feedback",
    tag = "Feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback applied", body = FeedbackResponse),
        (status = 400, description = "Missing contributions or correctness flag")
    )
)]
pub async fn feedback_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let outcome = state.engine.submit_feedback(&payload)?;

    Ok(Json(FeedbackResponse {
        applied: outcome.applied,
        skipped: outcome.skipped,
    }))
}
