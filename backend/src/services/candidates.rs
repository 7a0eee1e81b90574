use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::stores::ProfileStore;
use crate::error::DiscoveryError;
use crate::models::{CandidateQuery, DiscoveryFilter, UserProfile};
use crate::utils::context::RequestContext;

/// Caller-supplied exclusions plus everyone the requester already swiped on.
pub fn exclusion_set(filter: &DiscoveryFilter, swiped: &BTreeSet<Uuid>) -> BTreeSet<Uuid> {
    swiped.iter().chain(filter.excluded_ids.iter()).copied().collect()
}

/// Pulls the raw candidate population for a requester from the profile store.
pub struct CandidateSource {
    profiles: Arc<dyn ProfileStore>,
    hard_cap: usize,
}

impl CandidateSource {
    pub fn new(profiles: Arc<dyn ProfileStore>, hard_cap: usize) -> Self {
        Self { profiles, hard_cap }
    }

    /// Geographic search when the requester has a location, preference
    /// search otherwise. The requester, excluded IDs and any row failing the
    /// query predicates are dropped.
    pub async fn candidates(
        &self,
        ctx: &RequestContext,
        requester: &UserProfile,
        query: &CandidateQuery,
        exclusions: &BTreeSet<Uuid>,
        today: NaiveDate,
    ) -> Result<Vec<UserProfile>, DiscoveryError> {
        let rows = match requester.location {
            Some(center) => {
                ctx.guard(async {
                    self.profiles
                        .by_location(requester, center, query.max_distance_km, query, self.hard_cap, 0)
                        .await
                        .map_err(DiscoveryError::store("candidate search by location"))
                })
                .await?
            }
            None => {
                ctx.guard(async {
                    self.profiles
                        .by_preferences(requester, query, self.hard_cap, 0)
                        .await
                        .map_err(DiscoveryError::store("candidate search by preferences"))
                })
                .await?
            }
        };

        let fetched = rows.len();
        let candidates: Vec<UserProfile> = rows
            .into_iter()
            .filter(|c| c.id != requester.id)
            .filter(|c| !exclusions.contains(&c.id))
            .filter(|c| c.is_discoverable() && query.admits_profile(c, today))
            .collect();

        debug!(
            user_id = %requester.id,
            fetched,
            kept = candidates.len(),
            excluded = exclusions.len(),
            "Collected discovery candidates"
        );
        Ok(candidates)
    }
}
