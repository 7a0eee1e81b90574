use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use uuid::Uuid;

use crate::handlers::{caller_id, error_response, ApiResult, AppState};
use crate::services::PatternReport;

/// Advisory swipe-pattern report for `user_id`. Moderator authorisation is
/// expected to sit in front of this route.
pub async fn swipe_pattern(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> ApiResult<PatternReport> {
    let moderator_id = caller_id(&headers)?;
    tracing::info!(moderator_id = %moderator_id, user_id = %user_id, "Swipe pattern requested");

    let report = state
        .service
        .analyse_pattern(&state.context(), user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(report))
}
