use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::MAX_MATCHES_PAGE_SIZE;
use crate::handlers::{caller_id, error_response, ApiResult, AppState};
use crate::models::{Match, MatchPage, Pagination};

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

pub async fn list_matches(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<MatchesQuery>,
) -> ApiResult<MatchPage> {
    let user_id = caller_id(&headers)?;
    let pagination = Pagination::new(params.page, params.size, MAX_MATCHES_PAGE_SIZE);

    let page = state
        .service
        .matches(&state.context(), user_id, pagination)
        .await
        .map_err(error_response)?;

    Ok(Json(page))
}

pub async fn get_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(match_id): Path<Uuid>,
) -> ApiResult<Match> {
    let user_id = caller_id(&headers)?;
    let record = state
        .service
        .get_match(&state.context(), user_id, match_id)
        .await
        .map_err(error_response)?;

    Ok(Json(record))
}

/// Deactivates the caller's match with `other_id`. Swipes are kept.
pub async fn unmatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(other_id): Path<Uuid>,
) -> ApiResult<Match> {
    let user_id = caller_id(&headers)?;
    let record = state
        .service
        .unmatch(&state.context(), user_id, other_id)
        .await
        .map_err(error_response)?;

    Ok(Json(record))
}
