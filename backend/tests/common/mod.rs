#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use kindred::cache::TtlCache;
use kindred::db::{CounterStore, MatchStore, MemoryCounterStore, MemoryMatchStore, MemoryProfileStore, MemorySwipeStore};
use kindred::models::{Gender, SwipeDirection, UserProfile};
use kindred::services::{DiscoveryService, Stores, SwipeRequest};
use kindred::utils::{Clock, DiscoveryConfig, ManualClock};
use kindred::Uuid;

/// A discovery service wired to in-memory stores and a manual clock.
pub struct Harness {
    pub service: Arc<DiscoveryService>,
    pub profiles: Arc<MemoryProfileStore>,
    pub swipes: Arc<MemorySwipeStore>,
    pub matches: Arc<MemoryMatchStore>,
    pub cache: Arc<TtlCache>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DiscoveryConfig::default())
    }

    pub fn with_config(config: DiscoveryConfig) -> Self {
        Self::build(config, Arc::new(MemoryCounterStore::new()))
    }

    pub fn build(config: DiscoveryConfig, counters: Arc<dyn CounterStore>) -> Self {
        Self::assemble(config, counters, |matches| matches)
    }

    /// Lets a test put a wrapper in front of the in-memory match store.
    pub fn with_match_store(wrap: impl FnOnce(Arc<MemoryMatchStore>) -> Arc<dyn MatchStore>) -> Self {
        Self::assemble(DiscoveryConfig::default(), Arc::new(MemoryCounterStore::new()), wrap)
    }

    fn assemble(
        config: DiscoveryConfig,
        counters: Arc<dyn CounterStore>,
        wrap: impl FnOnce(Arc<MemoryMatchStore>) -> Arc<dyn MatchStore>,
    ) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let profiles = Arc::new(MemoryProfileStore::new(shared.clone()));
        let swipes = Arc::new(MemorySwipeStore::new());
        let matches = Arc::new(MemoryMatchStore::new());
        let cache = Arc::new(TtlCache::new(shared.clone()));

        let stores = Stores {
            profiles: profiles.clone(),
            swipes: swipes.clone(),
            matches: wrap(matches.clone()),
            counters,
            cache: cache.clone(),
        };
        Self {
            service: Arc::new(DiscoveryService::new(stores, &config, shared)),
            profiles,
            swipes,
            matches,
            cache,
            clock,
        }
    }

    pub async fn add(&self, profile: UserProfile) {
        self.profiles.upsert(profile).await;
    }

    pub async fn add_users(&self, ids: impl IntoIterator<Item = u128>) {
        for id in ids {
            self.add(adult(id)).await;
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

/// `aaaaaaaa-aaaa-aaaa-aaaa-0000000000NN` style IDs.
pub fn user(n: u128) -> Uuid {
    Uuid::from_u128(0xaaaaaaaa_aaaa_aaaa_aaaa_000000000000 | n)
}

/// A discoverable 30-something with a declared gender.
pub fn adult(n: u128) -> UserProfile {
    let mut profile = UserProfile::new(user(n));
    profile.first_name = Some(format!("User{}", n));
    profile.birth_date = NaiveDate::from_ymd_opt(1994, 2, 20);
    profile.gender = Some(Gender::Female);
    profile
}

pub fn swipe(from: u128, to: u128, direction: SwipeDirection) -> SwipeRequest {
    SwipeRequest {
        swiper_id: user(from),
        swiped_id: user(to),
        direction,
    }
}

pub fn like(from: u128, to: u128) -> SwipeRequest {
    swipe(from, to, SwipeDirection::Like)
}
