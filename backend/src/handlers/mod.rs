pub mod discovery;
pub mod matches;
pub mod moderation;
pub mod profiles;
pub mod swipes;

use axum::{
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::USER_ID_HEADER;
use crate::error::DiscoveryError;
use crate::services::DiscoveryService;
use crate::utils::context::RequestContext;

pub use discovery::discover;
pub use matches::{get_match, list_matches, unmatch};
pub use moderation::swipe_pattern;
pub use profiles::profile_changed;
pub use swipes::{create_swipe, stats, super_like, swipe_history};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DiscoveryService>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Fresh per-request context carrying the configured deadline.
    pub fn context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

/// Every route the server exposes. CORS and tracing layers are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/discover", get(discover))
        .route("/api/swipes", post(create_swipe))
        .route("/api/swipes/history", get(swipe_history))
        .route("/api/swipes/stats", get(stats))
        .route("/api/super-likes", post(super_like))
        .route("/api/matches", get(list_matches))
        .route("/api/matches/{id}", get(get_match))
        .route("/api/matches/with/{user_id}", delete(unmatch))
        .route("/api/moderation/patterns/{user_id}", get(swipe_pattern))
        .route("/api/profile/changed", post(profile_changed))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

/// Maps a core error onto its HTTP status and a body that never carries
/// store internals. Rate-limit denials include `remaining` and `reset_at`.
pub fn error_response(err: DiscoveryError) -> ApiError {
    let status = err.status_code();
    match &err {
        DiscoveryError::RateLimitExceeded {
            action,
            remaining,
            reset_at,
        } => (
            status,
            Json(json!({
                "error": "Rate limit exceeded. Please try again later.",
                "action": action,
                "remaining": remaining,
                "reset_at": reset_at,
            })),
        ),
        DiscoveryError::Store { .. } | DiscoveryError::RateLimitUnavailable(_) => {
            tracing::error!(error = %err, "Request failed on a backing store");
            (status, Json(json!({ "error": err.public_message() })))
        }
        _ => (status, Json(json!({ "error": err.public_message() }))),
    }
}

/// The caller's ID from the `X-User-Id` header.
pub fn caller_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Missing X-User-Id header" })),
            )
        })?;

    raw.trim()
        .parse()
        .map_err(|_| bad_request("X-User-Id must be a UUID"))
}
