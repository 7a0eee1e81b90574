use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::cache::CacheCoherence;
use crate::db::stores::SwipeStore;
use crate::error::{DiscoveryError, StoreError};
use crate::models::{StatsWindows, Swipe, SwipeDirection, SwipeStats};
use crate::utils::clock::Clock;
use crate::utils::context::RequestContext;

/// The authoritative record of who swiped on whom. All swipe writes go
/// through [`SwipeLedger::record`].
pub struct SwipeLedger {
    swipes: Arc<dyn SwipeStore>,
    cache: CacheCoherence,
    clock: Arc<dyn Clock>,
}

impl SwipeLedger {
    pub fn new(swipes: Arc<dyn SwipeStore>, cache: CacheCoherence, clock: Arc<dyn Clock>) -> Self {
        Self { swipes, cache, clock }
    }

    /// Appends `swipe`. A second swipe on the same ordered pair fails with
    /// [`DiscoveryError::DuplicateSwipe`] and leaves the first untouched.
    pub async fn record(&self, ctx: &RequestContext, swipe: &Swipe) -> Result<(), DiscoveryError> {
        if swipe.swiper_id == swipe.swiped_id {
            return Err(DiscoveryError::SelfSwipe);
        }

        ctx.guard(async {
            self.swipes.insert(swipe).await.map_err(|e| match e {
                StoreError::DuplicateSwipe => DiscoveryError::DuplicateSwipe,
                StoreError::SelfSwipe => DiscoveryError::SelfSwipe,
                other => DiscoveryError::store("swipe ledger insert")(other),
            })
        })
        .await?;

        debug!(
            swiper_id = %swipe.swiper_id,
            swiped_id = %swipe.swiped_id,
            direction = swipe.direction.as_str(),
            "Swipe recorded"
        );
        Ok(())
    }

    pub async fn has_swiped(&self, ctx: &RequestContext, swiper_id: Uuid, swiped_id: Uuid) -> Result<bool, DiscoveryError> {
        ctx.guard(async {
            self.swipes
                .exists(swiper_id, swiped_id)
                .await
                .map_err(DiscoveryError::store("swipe lookup"))
        })
        .await
    }

    pub async fn direction(
        &self,
        ctx: &RequestContext,
        swiper_id: Uuid,
        swiped_id: Uuid,
    ) -> Result<Option<SwipeDirection>, DiscoveryError> {
        ctx.guard(async {
            self.swipes
                .direction(swiper_id, swiped_id)
                .await
                .map_err(DiscoveryError::store("swipe direction lookup"))
        })
        .await
    }

    /// Swipes made by `user_id`, newest first.
    pub async fn history(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Swipe>, DiscoveryError> {
        ctx.guard(async {
            self.swipes
                .list(user_id, limit, offset)
                .await
                .map_err(DiscoveryError::store("swipe history"))
        })
        .await
    }

    /// Everyone `user_id` has swiped on, served from cache when possible.
    pub async fn swiped_set(&self, ctx: &RequestContext, user_id: Uuid) -> Result<BTreeSet<Uuid>, DiscoveryError> {
        if let Some(cached) = ctx.guard(async { Ok(self.cache.swiped_set(user_id).await) }).await? {
            return Ok(cached);
        }

        let swiped: BTreeSet<Uuid> = ctx
            .guard(async {
                self.swipes
                    .swiped_ids(user_id)
                    .await
                    .map_err(DiscoveryError::store("swiped set"))
            })
            .await?
            .into_iter()
            .collect();

        ctx.check()?;
        self.cache.store_swiped_set(user_id, &swiped).await;
        Ok(swiped)
    }

    pub async fn stats(&self, ctx: &RequestContext, user_id: Uuid) -> Result<SwipeStats, DiscoveryError> {
        if let Some(cached) = ctx.guard(async { Ok(self.cache.swipe_stats(user_id).await) }).await? {
            return Ok(cached);
        }

        let windows = StatsWindows::ending_at(self.clock.now());
        let stats = ctx
            .guard(async {
                self.swipes
                    .stats(user_id, windows)
                    .await
                    .map_err(DiscoveryError::store("swipe stats"))
            })
            .await?;

        ctx.check()?;
        self.cache.store_swipe_stats(user_id, &stats).await;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::db::memory::MemorySwipeStore;
    use crate::utils::clock::ManualClock;
    use crate::utils::config::CacheTtls;
    use chrono::{Duration, TimeZone, Utc};

    fn ledger() -> (SwipeLedger, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let cache = CacheCoherence::new(Arc::new(TtlCache::new(shared.clone())), CacheTtls::default());
        (SwipeLedger::new(Arc::new(MemorySwipeStore::new()), cache, shared), clock)
    }

    #[tokio::test]
    async fn test_duplicate_and_self_swipes_rejected() {
        let (ledger, clock) = ledger();
        let ctx = RequestContext::new();
        let (a, b) = (Uuid::from_u128(1), Uuid::from_u128(2));

        ledger.record(&ctx, &Swipe::new(a, b, SwipeDirection::Like, clock.now())).await.unwrap();
        let again = ledger.record(&ctx, &Swipe::new(a, b, SwipeDirection::Pass, clock.now())).await;
        assert!(matches!(again, Err(DiscoveryError::DuplicateSwipe)));
        assert_eq!(ledger.direction(&ctx, a, b).await.unwrap(), Some(SwipeDirection::Like));

        let own = ledger.record(&ctx, &Swipe::new(a, a, SwipeDirection::Like, clock.now())).await;
        assert!(matches!(own, Err(DiscoveryError::SelfSwipe)));
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let (ledger, clock) = ledger();
        let ctx = RequestContext::new();
        let a = Uuid::from_u128(1);
        for target in 2..5u128 {
            ledger
                .record(&ctx, &Swipe::new(a, Uuid::from_u128(target), SwipeDirection::Pass, clock.now()))
                .await
                .unwrap();
            clock.advance(Duration::seconds(5));
        }

        let history = ledger.history(&ctx, a, 2, 0).await.unwrap();
        let targets: Vec<u128> = history.iter().map(|s| s.swiped_id.as_u128()).collect();
        assert_eq!(targets, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_stats_windows_and_like_rate() {
        let (ledger, clock) = ledger();
        let ctx = RequestContext::new();
        let a = Uuid::from_u128(1);
        let old = clock.now() - Duration::days(10);
        ledger.record(&ctx, &Swipe::new(a, Uuid::from_u128(2), SwipeDirection::Like, old)).await.unwrap();
        ledger
            .record(&ctx, &Swipe::new(a, Uuid::from_u128(3), SwipeDirection::SuperLike, clock.now()))
            .await
            .unwrap();
        ledger
            .record(&ctx, &Swipe::new(a, Uuid::from_u128(4), SwipeDirection::Pass, clock.now()))
            .await
            .unwrap();
        ledger
            .record(&ctx, &Swipe::new(a, Uuid::from_u128(5), SwipeDirection::Pass, clock.now()))
            .await
            .unwrap();

        let stats = ledger.stats(&ctx, a).await.unwrap();
        assert_eq!(stats.total_swipes, 4);
        assert_eq!(stats.swipes_today, 3);
        assert_eq!(stats.swipes_this_week, 3);
        assert_eq!(stats.swipes_this_month, 4);
        assert!((stats.like_rate - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_swiped_set_is_cached_until_invalidated() {
        let (ledger, clock) = ledger();
        let ctx = RequestContext::new();
        let (a, b, c) = (Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3));

        ledger.record(&ctx, &Swipe::new(a, b, SwipeDirection::Like, clock.now())).await.unwrap();
        assert_eq!(ledger.swiped_set(&ctx, a).await.unwrap(), BTreeSet::from([b]));

        ledger.record(&ctx, &Swipe::new(a, c, SwipeDirection::Like, clock.now())).await.unwrap();
        assert_eq!(ledger.swiped_set(&ctx, a).await.unwrap(), BTreeSet::from([b]));

        ledger.cache.on_swipe(a, c).await;
        assert_eq!(ledger.swiped_set(&ctx, a).await.unwrap(), BTreeSet::from([b, c]));
    }
}
