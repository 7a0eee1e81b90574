use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::keys;
use crate::cache::store::Cache;
use crate::models::{CandidatePoolSnapshot, Match, MatchPage, SwipeStats};
use crate::utils::config::CacheTtls;

/// Owns every derived view the core caches and the invalidation fan-out
/// that keeps them in step with the swipe ledger and match store.
///
/// Reads never fail: a cache error or an undecodable value is a miss.
/// Writes and invalidations log failures and carry on; TTLs bound how long
/// a missed invalidation can be observed.
#[derive(Clone)]
pub struct CacheCoherence {
    cache: Arc<dyn Cache>,
    ttls: CacheTtls,
}

impl CacheCoherence {
    pub fn new(cache: Arc<dyn Cache>, ttls: CacheTtls) -> Self {
        Self { cache, ttls }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                if let Err(e) = self.cache.delete(key).await {
                    warn!(key, error = %e, "Failed to drop undecodable cache entry");
                }
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache value");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, encoded, ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    // Candidate pools

    pub async fn candidate_pool(
        &self,
        user_id: Uuid,
        filter_fp: &str,
        exclusion_fp: &str,
        page: u32,
        size: u32,
    ) -> Option<CandidatePoolSnapshot> {
        self.read(&keys::candidate_pool(user_id, filter_fp, exclusion_fp, page, size))
            .await
    }

    pub async fn store_candidate_pool(
        &self,
        user_id: Uuid,
        filter_fp: &str,
        exclusion_fp: &str,
        page: u32,
        size: u32,
        snapshot: &CandidatePoolSnapshot,
    ) {
        let key = keys::candidate_pool(user_id, filter_fp, exclusion_fp, page, size);
        self.write(&key, snapshot, self.ttls.candidate_pool).await;
    }

    // Matches

    pub async fn user_matches(&self, user_id: Uuid, page: u32, size: u32) -> Option<MatchPage> {
        self.read(&keys::user_matches(user_id, page, size)).await
    }

    pub async fn store_user_matches(&self, user_id: Uuid, page: u32, size: u32, matches: &MatchPage) {
        self.write(&keys::user_matches(user_id, page, size), matches, self.ttls.user_matches)
            .await;
    }

    pub async fn match_record(&self, match_id: Uuid) -> Option<Match> {
        self.read(&keys::match_record(match_id)).await
    }

    pub async fn store_match_record(&self, record: &Match) {
        self.write(&keys::match_record(record.id), record, self.ttls.match_record)
            .await;
    }

    // Swipes

    pub async fn swiped_set(&self, user_id: Uuid) -> Option<BTreeSet<Uuid>> {
        self.read(&keys::swiped_set(user_id)).await
    }

    pub async fn store_swiped_set(&self, user_id: Uuid, swiped: &BTreeSet<Uuid>) {
        self.write(&keys::swiped_set(user_id), swiped, self.ttls.swiped_set).await;
    }

    pub async fn swipe_stats(&self, user_id: Uuid) -> Option<SwipeStats> {
        self.read(&keys::swipe_stats(user_id)).await
    }

    pub async fn store_swipe_stats(&self, user_id: Uuid, stats: &SwipeStats) {
        self.write(&keys::swipe_stats(user_id), stats, self.ttls.swipe_stats).await;
    }

    // Invalidation fan-out

    async fn drop_key(&self, key: String) -> bool {
        match self.cache.delete(&key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache invalidation failed");
                false
            }
        }
    }

    async fn drop_pattern(&self, pattern: String) -> bool {
        match self.cache.delete_pattern(&pattern).await {
            Ok(removed) => {
                debug!(pattern = %pattern, removed, "Invalidated cache pattern");
                true
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Cache pattern invalidation failed");
                false
            }
        }
    }

    /// Swipe A → B: A's swiped set and stats change, and both users'
    /// candidate pools may now differ. Returns the number of failed deletes.
    pub async fn on_swipe(&self, swiper_id: Uuid, swiped_id: Uuid) -> usize {
        let results = [
            self.drop_key(keys::swiped_set(swiper_id)).await,
            self.drop_key(keys::swipe_stats(swiper_id)).await,
            self.drop_pattern(keys::candidate_pool_pattern(swiper_id)).await,
            self.drop_pattern(keys::candidate_pool_pattern(swiped_id)).await,
        ];
        results.iter().filter(|ok| !**ok).count()
    }

    /// New match between A and B: both match listings are stale.
    pub async fn on_match(&self, user_a: Uuid, user_b: Uuid) -> usize {
        let results = [
            self.drop_pattern(keys::user_matches_pattern(user_a)).await,
            self.drop_pattern(keys::user_matches_pattern(user_b)).await,
        ];
        results.iter().filter(|ok| !**ok).count()
    }

    /// Unmatch: both listings plus the match record itself.
    pub async fn on_unmatch(&self, user_a: Uuid, user_b: Uuid, match_id: Uuid) -> usize {
        let mut failed = self.on_match(user_a, user_b).await;
        if !self.drop_key(keys::match_record(match_id)).await {
            failed += 1;
        }
        failed
    }

    /// A profile change affects every pool the user might appear in; only
    /// the user's own pools are addressable, the rest age out by TTL.
    pub async fn on_profile_change(&self, user_id: Uuid) -> usize {
        usize::from(!self.drop_pattern(keys::candidate_pool_pattern(user_id)).await)
    }
}
