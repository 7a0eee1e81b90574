//! The public face of the core: every read and write a client can make goes
//! through [`DiscoveryService`], which sequences rate limiting, storage,
//! matching and cache maintenance for it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{Cache, CacheCoherence};
use crate::constants::{MATCH_SETTLE_TIMEOUT_MS, MAX_HISTORY_LIMIT};
use crate::db::stores::{CounterStore, MatchStore, ProfileStore, SwipeStore};
use crate::error::DiscoveryError;
use crate::models::{
    CandidatePoolSnapshot, CandidateQuery, DiscoveredProfile, DiscoveryFilter, DiscoveryPage, Match, MatchPage,
    Pagination, ScoredCandidate, Swipe, SwipeDirection, SwipeStats, UserProfile,
};
use crate::services::candidates::{exclusion_set, CandidateSource};
use crate::services::ledger::SwipeLedger;
use crate::services::match_detector::{MatchDetector, MatchOutcome};
use crate::services::pattern_analyzer::{PatternAnalyzer, PatternReport};
use crate::services::rate_limiter::{RateAction, RateLimiter};
use crate::services::scoring::{paginate, Scorer};
use crate::utils::clock::Clock;
use crate::utils::config::DiscoveryConfig;
use crate::utils::context::RequestContext;
use crate::utils::fingerprint::{exclusion_fingerprint, filter_fingerprint};
use crate::utils::geo::distance_between;

/// Storage collaborators the service is assembled from.
#[derive(Clone)]
pub struct Stores {
    pub profiles: Arc<dyn ProfileStore>,
    pub swipes: Arc<dyn SwipeStore>,
    pub matches: Arc<dyn MatchStore>,
    pub counters: Arc<dyn CounterStore>,
    pub cache: Arc<dyn Cache>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwipeRequest {
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub direction: SwipeDirection,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwipeAck {
    pub swipe_id: Uuid,
    pub direction: SwipeDirection,
    pub is_match: bool,
    #[serde(rename = "match")]
    pub match_record: Option<Match>,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

pub struct DiscoveryService {
    profiles: Arc<dyn ProfileStore>,
    limiter: RateLimiter,
    source: CandidateSource,
    scorer: Scorer,
    ledger: Arc<SwipeLedger>,
    detector: MatchDetector,
    analyzer: PatternAnalyzer,
    cache: CacheCoherence,
    clock: Arc<dyn Clock>,
    default_max_distance_km: f64,
}

impl DiscoveryService {
    pub fn new(stores: Stores, config: &DiscoveryConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = CacheCoherence::new(stores.cache, config.cache_ttls);
        let ledger = Arc::new(SwipeLedger::new(stores.swipes, cache.clone(), clock.clone()));

        Self {
            limiter: RateLimiter::new(stores.counters, config.rate_limits, clock.clone()),
            source: CandidateSource::new(stores.profiles.clone(), config.candidate_hard_cap),
            scorer: Scorer::new(config.weights),
            detector: MatchDetector::new(stores.matches, ledger.clone(), clock.clone()),
            analyzer: PatternAnalyzer::new(ledger.clone()),
            profiles: stores.profiles,
            ledger,
            cache,
            clock,
            default_max_distance_km: config.default_max_distance_km,
        }
    }

    // Discovery

    /// One page of ranked candidates for `user_id`. A cancelled or timed-out
    /// call never writes the candidate-pool cache.
    pub async fn discover(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        filter: &DiscoveryFilter,
        pagination: Pagination,
    ) -> Result<DiscoveryPage, DiscoveryError> {
        ctx.guard(self.limiter.enforce(user_id, RateAction::Discovery)).await?;

        let requester = self.require_profile(ctx, user_id, "user").await?;
        let query = CandidateQuery::resolve(filter, &requester.interested_in, self.default_max_distance_km);
        let swiped = self.ledger.swiped_set(ctx, user_id).await?;
        let exclusions = exclusion_set(filter, &swiped);

        let filter_fp = filter_fingerprint(&query);
        let exclusion_fp = exclusion_fingerprint(&exclusions);
        let now = self.clock.now();
        let today = now.date_naive();

        let cached = ctx
            .guard(async {
                Ok(self
                    .cache
                    .candidate_pool(user_id, &filter_fp, &exclusion_fp, pagination.page, pagination.size)
                    .await)
            })
            .await?;

        let page = match cached {
            Some(snapshot) => {
                debug!(user_id = %user_id, page = pagination.page, "Candidate pool cache hit");
                let candidates = self.hydrate(ctx, &requester, &snapshot, &exclusions, today).await?;
                DiscoveryPage {
                    candidates,
                    total: snapshot.total,
                    page: pagination.page,
                    page_size: pagination.size,
                    from_cache: true,
                }
            }
            None => {
                let pool = self.source.candidates(ctx, &requester, &query, &exclusions, today).await?;
                let ranked = self.scorer.rank(&requester, &query, pool, now);
                let window = paginate(&ranked, pagination.offset(), pagination.limit());

                let snapshot = CandidatePoolSnapshot {
                    candidates: window
                        .iter()
                        .map(|r| ScoredCandidate {
                            user_id: r.profile.id,
                            score: r.score,
                        })
                        .collect(),
                    total: ranked.len(),
                };

                ctx.check()?;
                self.cache
                    .store_candidate_pool(user_id, &filter_fp, &exclusion_fp, pagination.page, pagination.size, &snapshot)
                    .await;

                DiscoveryPage {
                    candidates: window
                        .iter()
                        .map(|r| discovered(&r.profile, r.score, r.distance_km, today))
                        .collect(),
                    total: ranked.len(),
                    page: pagination.page,
                    page_size: pagination.size,
                    from_cache: false,
                }
            }
        };

        self.touch(user_id).await;
        Ok(page)
    }

    /// Rebuilds a cached page from current profiles, dropping anyone who has
    /// since become undiscoverable or excluded.
    async fn hydrate(
        &self,
        ctx: &RequestContext,
        requester: &UserProfile,
        snapshot: &CandidatePoolSnapshot,
        exclusions: &BTreeSet<Uuid>,
        today: NaiveDate,
    ) -> Result<Vec<DiscoveredProfile>, DiscoveryError> {
        let ids: Vec<Uuid> = snapshot.candidates.iter().map(|c| c.user_id).collect();
        let profiles: HashMap<Uuid, UserProfile> = ctx
            .guard(async {
                self.profiles
                    .get_many(&ids)
                    .await
                    .map_err(DiscoveryError::store("candidate hydration"))
            })
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(snapshot
            .candidates
            .iter()
            .filter_map(|scored| {
                let profile = profiles.get(&scored.user_id)?;
                let keep = profile.is_discoverable() && profile.id != requester.id && !exclusions.contains(&profile.id);
                keep.then(|| {
                    let distance = distance_between(requester.location, profile.location);
                    discovered(profile, scored.score, distance, today)
                })
            })
            .collect())
    }

    // Swiping

    /// Records a like or pass. A super-like direction is routed through the
    /// super-like allowance.
    pub async fn swipe(&self, ctx: &RequestContext, request: &SwipeRequest) -> Result<SwipeAck, DiscoveryError> {
        let action = match request.direction {
            SwipeDirection::SuperLike => RateAction::SuperLike,
            SwipeDirection::Like | SwipeDirection::Pass => RateAction::Swipe,
        };
        self.record_swipe(ctx, request.swiper_id, request.swiped_id, request.direction, action)
            .await
    }

    pub async fn super_like(&self, ctx: &RequestContext, swiper_id: Uuid, swiped_id: Uuid) -> Result<SwipeAck, DiscoveryError> {
        self.record_swipe(ctx, swiper_id, swiped_id, SwipeDirection::SuperLike, RateAction::SuperLike)
            .await
    }

    async fn record_swipe(
        &self,
        ctx: &RequestContext,
        swiper_id: Uuid,
        swiped_id: Uuid,
        direction: SwipeDirection,
        action: RateAction,
    ) -> Result<SwipeAck, DiscoveryError> {
        let decision = ctx.guard(self.limiter.enforce(swiper_id, action)).await?;

        if swiper_id == swiped_id {
            return Err(DiscoveryError::SelfSwipe);
        }
        self.require_profile(ctx, swiped_id, "profile").await?;

        let swipe = Swipe::new(swiper_id, swiped_id, direction, self.clock.now());
        match self.ledger.record(ctx, &swipe).await {
            Ok(()) => {}
            Err(DiscoveryError::DuplicateSwipe) if direction.is_positive() => {
                // An earlier attempt may have committed the like but lost its match step.
                self.settle_match(swiper_id, swiped_id).await?;
                return Err(DiscoveryError::DuplicateSwipe);
            }
            Err(e) => {
                if e.is_cancellation() {
                    // The insert may have landed before the guard fired.
                    self.invalidate_swipe(swiper_id, swiped_id, false).await;
                }
                return Err(e);
            }
        }

        // The swipe is committed, so the match step must not die with the request.
        let detection = if direction.is_positive() {
            let settle = RequestContext::with_timeout(Duration::from_millis(MATCH_SETTLE_TIMEOUT_MS));
            self.detector.check_and_create(&settle, swiper_id, swiped_id).await
        } else {
            Ok(MatchOutcome::none())
        };

        match detection {
            Ok(outcome) => {
                self.invalidate_swipe(swiper_id, swiped_id, outcome.created).await;
                ctx.check()?;

                self.touch(swiper_id).await;
                info!(
                    swiper_id = %swiper_id,
                    swiped_id = %swiped_id,
                    direction = direction.as_str(),
                    is_match = outcome.is_match,
                    "Swipe accepted"
                );
                Ok(SwipeAck {
                    swipe_id: swipe.id,
                    direction,
                    is_match: outcome.is_match,
                    match_record: outcome.record,
                    remaining: decision.remaining,
                    reset_at: decision.reset_at,
                })
            }
            Err(e) => {
                // The swipe is committed; the match step may or may not be.
                self.invalidate_swipe(swiper_id, swiped_id, true).await;
                Err(e)
            }
        }
    }

    /// Creates the match for a pair whose likes are already on record.
    async fn settle_match(&self, swiper_id: Uuid, swiped_id: Uuid) -> Result<(), DiscoveryError> {
        let settle = RequestContext::with_timeout(Duration::from_millis(MATCH_SETTLE_TIMEOUT_MS));
        let outcome = self.detector.check_and_create(&settle, swiper_id, swiped_id).await?;
        if outcome.created {
            self.invalidate_swipe(swiper_id, swiped_id, true).await;
            info!(swiper_id = %swiper_id, swiped_id = %swiped_id, "Recovered match for existing likes");
        }
        Ok(())
    }

    async fn invalidate_swipe(&self, swiper_id: Uuid, swiped_id: Uuid, matched: bool) {
        let mut failed = self.cache.on_swipe(swiper_id, swiped_id).await;
        if matched {
            failed += self.cache.on_match(swiper_id, swiped_id).await;
        }
        if failed > 0 {
            warn!(swiper_id = %swiper_id, swiped_id = %swiped_id, failed, "Some swipe invalidations failed");
        }
    }

    pub async fn history(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Swipe>, DiscoveryError> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT) as usize;
        self.ledger.history(ctx, user_id, limit, offset as usize).await
    }

    pub async fn stats(&self, ctx: &RequestContext, user_id: Uuid) -> Result<SwipeStats, DiscoveryError> {
        self.ledger.stats(ctx, user_id).await
    }

    // Matches

    pub async fn matches(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<MatchPage, DiscoveryError> {
        let cached = ctx
            .guard(async { Ok(self.cache.user_matches(user_id, pagination.page, pagination.size).await) })
            .await?;
        if let Some(page) = cached {
            return Ok(page);
        }

        let page = self
            .detector
            .list(ctx, user_id, pagination.limit(), pagination.offset())
            .await?;
        ctx.check()?;
        self.cache
            .store_user_matches(user_id, pagination.page, pagination.size, &page)
            .await;
        Ok(page)
    }

    /// A single match, visible only to its two members.
    pub async fn get_match(&self, ctx: &RequestContext, requester_id: Uuid, match_id: Uuid) -> Result<Match, DiscoveryError> {
        let cached = ctx.guard(async { Ok(self.cache.match_record(match_id).await) }).await?;
        let record = match cached {
            Some(record) => record,
            None => {
                let record = self
                    .detector
                    .get(ctx, match_id)
                    .await?
                    .ok_or_else(|| DiscoveryError::NotFound("match".to_string()))?;
                ctx.check()?;
                self.cache.store_match_record(&record).await;
                record
            }
        };

        if !record.pair().contains(requester_id) {
            return Err(DiscoveryError::Forbidden("match belongs to other users".to_string()));
        }
        Ok(record)
    }

    /// Deactivates the match between the requester and `other_id`.
    pub async fn unmatch(&self, ctx: &RequestContext, requester_id: Uuid, other_id: Uuid) -> Result<Match, DiscoveryError> {
        let record = self.detector.unmatch(ctx, requester_id, other_id).await?;

        let failed = self.cache.on_unmatch(requester_id, other_id, record.id).await;
        if failed > 0 {
            warn!(match_id = %record.id, failed, "Some unmatch invalidations failed");
        }
        ctx.check()?;
        Ok(record)
    }

    // Moderation and maintenance

    pub async fn analyse_pattern(&self, ctx: &RequestContext, user_id: Uuid) -> Result<PatternReport, DiscoveryError> {
        self.analyzer.analyse(ctx, user_id).await
    }

    /// Drops cached candidate pages after `user_id` edits their profile.
    pub async fn on_profile_updated(&self, user_id: Uuid) {
        let failed = self.cache.on_profile_change(user_id).await;
        if failed > 0 {
            warn!(user_id = %user_id, "Profile change invalidation failed");
        }
    }

    async fn require_profile(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        what: &str,
    ) -> Result<UserProfile, DiscoveryError> {
        ctx.guard(async {
            self.profiles
                .get(user_id)
                .await
                .map_err(DiscoveryError::store("profile lookup"))
        })
        .await?
        .filter(|p| p.is_discoverable())
        .ok_or_else(|| DiscoveryError::NotFound(what.to_string()))
    }

    async fn touch(&self, user_id: Uuid) {
        if let Err(e) = self.profiles.update_last_active(user_id, self.clock.now()).await {
            warn!(user_id = %user_id, error = %e, "Failed to update last active time");
        }
    }
}

fn discovered(profile: &UserProfile, score: f64, distance_km: Option<f64>, today: NaiveDate) -> DiscoveredProfile {
    DiscoveredProfile {
        user_id: profile.id,
        first_name: profile.first_name.clone(),
        age: profile.age_on(today),
        gender: profile.gender,
        city: profile.city.clone(),
        country: profile.country.clone(),
        distance_km: distance_km.map(|km| (km * 10.0).round() / 10.0),
        is_verified: profile.verification_level.is_verified(),
        is_premium: profile.is_premium,
        score,
    }
}
