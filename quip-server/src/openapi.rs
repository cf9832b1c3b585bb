//! OpenAPI documentation configuration
//!
//! Generates OpenAPI 3.0 specification for the Quip similarity API.

use utoipa::OpenApi;

use crate::handlers::{
    CheckRequest, CheckResponse, FeedbackRequest, FeedbackResponse, HealthResponse,
    ObserveRequest, ObserveResponse, ReadyResponse, WeightEntry, WeightsResponse,
};

/// Quip Similarity API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quip - Similarity API",
        version = "0.1.0",
        description = r#"
## Weighted Multi-Hash Image Similarity

Quip estimates whether an image is AI-generated by comparing its perceptual
hash digests against previously judged images.

### How It Works

1. **Observe** judged images via `POST /observations`
2. **Check** a new image via `POST /check`: stored records are ranked by a
   trust-weighted Hamming distance across hash types, and the AI likelihood
   of the nearest `k` is averaged
3. **Feedback** on a past prediction via `POST /feedback` shifts trust
   toward the hash types that ranked well
4. Inspect the current trust state via `GET /weights`

Digests are sent as hex or standard base64 strings keyed by hash type:
`mean`, `gradient`, `double_gradient`, `block`, `dct`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:5050", description = "Local development server")
    ),
    tags(
        (name = "Observations", description = "Store judged images"),
        (name = "Similarity", description = "Estimate AI likelihood from nearest neighbours"),
        (name = "Feedback", description = "Trust weights and prediction feedback"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::observe::observe_handler,
        crate::handlers::check::check_handler,
        crate::handlers::feedback::feedback_handler,
        crate::handlers::weights::weights_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            ObserveRequest,
            ObserveResponse,
            CheckRequest,
            CheckResponse,
            FeedbackRequest,
            FeedbackResponse,
            WeightEntry,
            WeightsResponse,
        )
    )
)]
pub struct ApiDoc;
