use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::MAX_DISCOVERY_PAGE_SIZE;
use crate::handlers::{bad_request, caller_id, error_response, ApiError, ApiResult, AppState};
use crate::models::{DiscoveryFilter, DiscoveryPage, Gender, Pagination};

/// Query string for `GET /api/discover`. List-valued fields are comma
/// separated, e.g. `interested_in=female,non_binary`.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub max_distance_km: Option<f64>,
    pub interested_in: Option<String>,
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default)]
    pub with_photos_only: bool,
    pub exclude: Option<String>,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

impl DiscoverQuery {
    pub fn filter(&self) -> Result<DiscoveryFilter, ApiError> {
        let interested_in = split_list(self.interested_in.as_deref())
            .map(|g| g.parse::<Gender>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(bad_request)?;
        let excluded_ids = split_list(self.exclude.as_deref())
            .map(|id| id.parse::<Uuid>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| bad_request("exclude must be a comma separated list of UUIDs"))?;

        Ok(DiscoveryFilter {
            min_age: self.min_age,
            max_age: self.max_age,
            max_distance_km: self.max_distance_km,
            interested_in,
            verified_only: self.verified_only,
            with_photos_only: self.with_photos_only,
            excluded_ids,
        })
    }
}

pub async fn discover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DiscoverQuery>,
) -> ApiResult<DiscoveryPage> {
    let user_id = caller_id(&headers)?;
    let filter = params.filter()?;
    let pagination = Pagination::new(params.page, params.size, MAX_DISCOVERY_PAGE_SIZE);

    let page = state
        .service
        .discover(&state.context(), user_id, &filter, pagination)
        .await
        .map_err(error_response)?;

    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_filter_parses_lists() {
        let query = DiscoverQuery {
            interested_in: Some("female, non_binary".to_string()),
            exclude: Some("aaaaaaaa-aaaa-aaaa-aaaa-000000000002".to_string()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.interested_in, vec![Gender::Female, Gender::NonBinary]);
        assert_eq!(filter.excluded_ids.len(), 1);
    }

    #[test]
    fn test_unknown_gender_is_rejected() {
        let query = DiscoverQuery {
            interested_in: Some("robot".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
