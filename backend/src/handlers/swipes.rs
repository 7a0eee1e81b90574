use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::handlers::{caller_id, error_response, ApiError, AppState};
use crate::models::{Swipe, SwipeDirection, SwipeStats};
use crate::services::{SwipeAck, SwipeRequest};

#[derive(Debug, Deserialize)]
pub struct SwipeBody {
    pub swiped_id: Uuid,
    pub direction: SwipeDirection,
}

#[derive(Debug, Deserialize)]
pub struct SuperLikeBody {
    pub swiped_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn create_swipe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SwipeBody>,
) -> Result<(StatusCode, Json<SwipeAck>), ApiError> {
    let swiper_id = caller_id(&headers)?;
    let request = SwipeRequest {
        swiper_id,
        swiped_id: body.swiped_id,
        direction: body.direction,
    };

    let ack = state
        .service
        .swipe(&state.context(), &request)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(ack)))
}

pub async fn super_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SuperLikeBody>,
) -> Result<(StatusCode, Json<SwipeAck>), ApiError> {
    let swiper_id = caller_id(&headers)?;
    let ack = state
        .service
        .super_like(&state.context(), swiper_id, body.swiped_id)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(ack)))
}

pub async fn swipe_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Swipe>>, ApiError> {
    let user_id = caller_id(&headers)?;
    let swipes = state
        .service
        .history(
            &state.context(),
            user_id,
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            params.offset.unwrap_or(0),
        )
        .await
        .map_err(error_response)?;

    Ok(Json(swipes))
}

pub async fn stats(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SwipeStats>, ApiError> {
    let user_id = caller_id(&headers)?;
    let stats = state
        .service
        .stats(&state.context(), user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(stats))
}
