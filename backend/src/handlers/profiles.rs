use axum::{extract::State, http::HeaderMap, http::StatusCode};

use crate::handlers::{caller_id, ApiError, AppState};

/// Called by the profile service after the caller edits or completes their
/// profile, so their cached candidate pages are rebuilt on the next request.
pub async fn profile_changed(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let user_id = caller_id(&headers)?;
    state.service.on_profile_updated(user_id).await;
    Ok(StatusCode::NO_CONTENT)
}
