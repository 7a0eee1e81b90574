use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::stores::MatchStore;
use crate::error::DiscoveryError;
use crate::models::{CanonicalPair, Match, MatchInsert, MatchPage};
use crate::services::ledger::SwipeLedger;
use crate::utils::clock::Clock;
use crate::utils::context::RequestContext;

/// Result of a mutual-like check. `created` is true only for the caller
/// whose insert actually produced the match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub is_match: bool,
    pub record: Option<Match>,
    pub created: bool,
}

impl MatchOutcome {
    pub fn none() -> Self {
        Self {
            is_match: false,
            record: None,
            created: false,
        }
    }
}

/// Turns mutual likes into matches, once per unordered pair.
pub struct MatchDetector {
    matches: Arc<dyn MatchStore>,
    ledger: Arc<SwipeLedger>,
    clock: Arc<dyn Clock>,
}

impl MatchDetector {
    pub fn new(matches: Arc<dyn MatchStore>, ledger: Arc<SwipeLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { matches, ledger, clock }
    }

    /// Creates the match for {a, b} if both have liked each other and no
    /// match exists yet. Concurrent callers for the same pair race on the
    /// conditional insert; exactly one sees `created = true`.
    pub async fn check_and_create(&self, ctx: &RequestContext, a: Uuid, b: Uuid) -> Result<MatchOutcome, DiscoveryError> {
        let pair = CanonicalPair::new(a, b);

        if let Some(existing) = self.find_pair(ctx, pair).await? {
            return Ok(MatchOutcome {
                is_match: existing.is_active,
                record: Some(existing),
                created: false,
            });
        }

        let forward = self.ledger.direction(ctx, a, b).await?;
        let backward = self.ledger.direction(ctx, b, a).await?;
        let mutual = forward.is_some_and(|d| d.is_positive()) && backward.is_some_and(|d| d.is_positive());
        if !mutual {
            return Ok(MatchOutcome::none());
        }

        let candidate = Match::new(pair, self.clock.now());
        let inserted = ctx
            .guard(async {
                self.matches
                    .insert_if_absent(&candidate)
                    .await
                    .map_err(DiscoveryError::store("match insert"))
            })
            .await?;

        match inserted {
            MatchInsert::Inserted(record) => {
                info!(
                    match_id = %record.id,
                    user_id_1 = %record.user_id_1,
                    user_id_2 = %record.user_id_2,
                    "Match created"
                );
                Ok(MatchOutcome {
                    is_match: true,
                    record: Some(record),
                    created: true,
                })
            }
            MatchInsert::Existing(record) => {
                debug!(match_id = %record.id, "Match already created by a concurrent swipe");
                Ok(MatchOutcome {
                    is_match: record.is_active,
                    record: Some(record),
                    created: false,
                })
            }
        }
    }

    pub async fn find_pair(&self, ctx: &RequestContext, pair: CanonicalPair) -> Result<Option<Match>, DiscoveryError> {
        ctx.guard(async {
            self.matches
                .get_pair(pair)
                .await
                .map_err(DiscoveryError::store("match pair lookup"))
        })
        .await
    }

    pub async fn get(&self, ctx: &RequestContext, match_id: Uuid) -> Result<Option<Match>, DiscoveryError> {
        ctx.guard(async {
            self.matches
                .get(match_id)
                .await
                .map_err(DiscoveryError::store("match lookup"))
        })
        .await
    }

    /// Active matches for `user_id`, newest first, with the active total.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> Result<MatchPage, DiscoveryError> {
        let matches = ctx
            .guard(async {
                self.matches
                    .list(user_id, limit, offset)
                    .await
                    .map_err(DiscoveryError::store("match listing"))
            })
            .await?;
        let total = ctx
            .guard(async {
                self.matches
                    .count(user_id)
                    .await
                    .map_err(DiscoveryError::store("match count"))
            })
            .await?;

        Ok(MatchPage { matches, total })
    }

    /// Deactivates the active match for {a, b}. The match row and both
    /// swipes stay in place.
    pub async fn unmatch(&self, ctx: &RequestContext, a: Uuid, b: Uuid) -> Result<Match, DiscoveryError> {
        let pair = CanonicalPair::new(a, b);
        let mut record = self
            .find_pair(ctx, pair)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| DiscoveryError::NotFound("active match".to_string()))?;

        record.is_active = false;
        ctx.guard(async {
            self.matches
                .update(&record)
                .await
                .map_err(DiscoveryError::store("unmatch"))
        })
        .await?;

        info!(match_id = %record.id, requested_by = %a, "Match deactivated");
        Ok(record)
    }
}
