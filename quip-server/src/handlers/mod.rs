//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod check;
pub mod feedback;
pub mod health;
pub mod observe;
pub mod weights;

pub use crate::state::AppState;
pub use check::{check_handler, CheckRequest, CheckResponse};
pub use feedback::{feedback_handler, FeedbackRequest, FeedbackResponse};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use observe::{observe_handler, ObserveRequest, ObserveResponse};
pub use weights::{weights_handler, WeightEntry, WeightsResponse};
