//! In-process store adapters. Each adapter serialises its writes behind a
//! single lock, so the conditional inserts required by the store contracts
//! are atomic. Used by the test suite and for running without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::db::stores::{
    AcquireOutcome, CounterSlot, CounterState, CounterStore, MatchStore, ProfileStore, StoreResult, SwipeStore,
};
use crate::error::StoreError;
use crate::models::{
    CandidateQuery, CanonicalPair, Coordinates, Match, MatchInsert, StatsWindows, Swipe, SwipeDirection, SwipeStats,
    UserProfile,
};
use crate::utils::clock::Clock;
use crate::utils::geo::haversine_km;

fn page<T>(items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

// Profile store

pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
    clock: Arc<dyn Clock>,
}

impl MemoryProfileStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub async fn upsert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

fn searchable<'a>(
    profiles: &'a HashMap<Uuid, UserProfile>,
    requester_id: Uuid,
    query: &'a CandidateQuery,
    today: NaiveDate,
) -> impl Iterator<Item = &'a UserProfile> {
    profiles
        .values()
        .filter(move |p| p.id != requester_id && p.is_discoverable() && query.admits_profile(p, today))
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }

    async fn by_location(
        &self,
        requester: &UserProfile,
        center: Coordinates,
        radius_km: f64,
        query: &CandidateQuery,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        let today = self.clock.now().date_naive();
        let mut nearby: Vec<(f64, &UserProfile)> = searchable(&profiles, requester.id, query, today)
            .filter_map(|p| {
                let distance = haversine_km(center, p.location?);
                (distance <= radius_km).then_some((distance, p))
            })
            .collect();
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

        Ok(page(nearby.into_iter().map(|(_, p)| p.clone()).collect(), limit, offset))
    }

    async fn by_preferences(
        &self,
        requester: &UserProfile,
        query: &CandidateQuery,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        let today = self.clock.now().date_naive();
        let mut found: Vec<&UserProfile> = searchable(&profiles, requester.id, query, today).collect();
        found.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at).then_with(|| a.id.cmp(&b.id)));

        Ok(page(found.into_iter().cloned().collect(), limit, offset))
    }

    async fn update_last_active(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(profile) = self.profiles.write().await.get_mut(&id) {
            profile.last_active_at = Some(at);
        }
        Ok(())
    }
}

// Swipe store

#[derive(Default)]
struct Ledger {
    by_pair: HashMap<(Uuid, Uuid), Swipe>,
    by_swiper: HashMap<Uuid, Vec<Swipe>>,
}

#[derive(Default)]
pub struct MemorySwipeStore {
    ledger: Mutex<Ledger>,
}

impl MemorySwipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored swipes across all users.
    pub async fn len(&self) -> usize {
        self.ledger.lock().await.by_pair.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SwipeStore for MemorySwipeStore {
    async fn insert(&self, swipe: &Swipe) -> StoreResult<()> {
        if swipe.swiper_id == swipe.swiped_id {
            return Err(StoreError::SelfSwipe);
        }
        let mut ledger = self.ledger.lock().await;
        let key = (swipe.swiper_id, swipe.swiped_id);
        if ledger.by_pair.contains_key(&key) {
            return Err(StoreError::DuplicateSwipe);
        }
        ledger.by_pair.insert(key, swipe.clone());
        ledger.by_swiper.entry(swipe.swiper_id).or_default().push(swipe.clone());
        Ok(())
    }

    async fn exists(&self, swiper_id: Uuid, swiped_id: Uuid) -> StoreResult<bool> {
        Ok(self.ledger.lock().await.by_pair.contains_key(&(swiper_id, swiped_id)))
    }

    async fn direction(&self, swiper_id: Uuid, swiped_id: Uuid) -> StoreResult<Option<SwipeDirection>> {
        Ok(self
            .ledger
            .lock()
            .await
            .by_pair
            .get(&(swiper_id, swiped_id))
            .map(|s| s.direction))
    }

    async fn list(&self, user_id: Uuid, limit: usize, offset: usize) -> StoreResult<Vec<Swipe>> {
        let mut swipes = self
            .ledger
            .lock()
            .await
            .by_swiper
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        swipes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(page(swipes, limit, offset))
    }

    async fn swiped_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .ledger
            .lock()
            .await
            .by_swiper
            .get(&user_id)
            .map(|swipes| swipes.iter().map(|s| s.swiped_id).collect())
            .unwrap_or_default())
    }

    async fn stats(&self, user_id: Uuid, windows: StatsWindows) -> StoreResult<SwipeStats> {
        let ledger = self.ledger.lock().await;
        let mut stats = SwipeStats::default();
        for swipe in ledger.by_swiper.get(&user_id).into_iter().flatten() {
            stats.total_swipes += 1;
            match swipe.direction {
                SwipeDirection::Like => stats.likes += 1,
                SwipeDirection::Pass => stats.passes += 1,
                SwipeDirection::SuperLike => stats.super_likes += 1,
            }
            if swipe.created_at >= windows.day_start {
                stats.swipes_today += 1;
            }
            if swipe.created_at >= windows.week_start {
                stats.swipes_this_week += 1;
            }
            if swipe.created_at >= windows.month_start {
                stats.swipes_this_month += 1;
            }
        }
        Ok(stats.with_like_rate())
    }

    async fn recent_swipers(&self, since: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Uuid>> {
        let ledger = self.ledger.lock().await;
        let swipers: BTreeSet<Uuid> = ledger
            .by_swiper
            .iter()
            .filter(|(_, swipes)| swipes.iter().any(|s| s.created_at >= since))
            .map(|(id, _)| *id)
            .collect();
        Ok(swipers.into_iter().take(limit).collect())
    }
}

// Match store

#[derive(Default)]
struct MatchTable {
    by_id: HashMap<Uuid, Match>,
    by_pair: HashMap<CanonicalPair, Uuid>,
}

#[derive(Default)]
pub struct MemoryMatchStore {
    table: Mutex<MatchTable>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored match, active or not.
    pub async fn all(&self) -> Vec<Match> {
        self.table.lock().await.by_id.values().cloned().collect()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Match>> {
        Ok(self.table.lock().await.by_id.get(&id).cloned())
    }

    async fn get_pair(&self, pair: CanonicalPair) -> StoreResult<Option<Match>> {
        let table = self.table.lock().await;
        Ok(table.by_pair.get(&pair).and_then(|id| table.by_id.get(id)).cloned())
    }

    async fn insert_if_absent(&self, record: &Match) -> StoreResult<MatchInsert> {
        let mut table = self.table.lock().await;
        let pair = record.pair();
        if let Some(existing) = table.by_pair.get(&pair).and_then(|id| table.by_id.get(id)) {
            return Ok(MatchInsert::Existing(existing.clone()));
        }
        table.by_pair.insert(pair, record.id);
        table.by_id.insert(record.id, record.clone());
        Ok(MatchInsert::Inserted(record.clone()))
    }

    async fn update(&self, record: &Match) -> StoreResult<()> {
        if let Some(stored) = self.table.lock().await.by_id.get_mut(&record.id) {
            stored.is_active = record.is_active;
        }
        Ok(())
    }

    async fn list(&self, user_id: Uuid, limit: usize, offset: usize) -> StoreResult<Vec<Match>> {
        let table = self.table.lock().await;
        let mut matches: Vec<Match> = table
            .by_id
            .values()
            .filter(|m| m.is_active && m.pair().contains(user_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page(matches, limit, offset))
    }

    async fn count(&self, user_id: Uuid) -> StoreResult<i64> {
        let table = self.table.lock().await;
        Ok(table
            .by_id
            .values()
            .filter(|m| m.is_active && m.pair().contains(user_id))
            .count() as i64)
    }
}

// Rate-limit counters

#[derive(Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, CounterState>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops counters whose window has elapsed. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut counters = self.counters.lock().await;
        let before = counters.len();
        counters.retain(|_, state| state.expires_at > now);
        before - counters.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn try_acquire(&self, slots: &[CounterSlot], now: DateTime<Utc>) -> StoreResult<AcquireOutcome> {
        let mut counters = self.counters.lock().await;

        let current: Vec<CounterState> = slots
            .iter()
            .map(|slot| match counters.get(&slot.key) {
                Some(state) if state.expires_at > now => *state,
                _ => CounterState {
                    count: 0,
                    expires_at: now + slot.window,
                },
            })
            .collect();

        let acquired = slots.iter().zip(&current).all(|(slot, state)| state.count < slot.limit);
        if !acquired {
            return Ok(AcquireOutcome {
                acquired,
                counters: current,
            });
        }

        let mut updated = Vec::with_capacity(slots.len());
        for (slot, state) in slots.iter().zip(current) {
            let next = CounterState {
                count: state.count + 1,
                expires_at: state.expires_at,
            };
            counters.insert(slot.key.clone(), next);
            updated.push(next);
        }
        Ok(AcquireOutcome {
            acquired,
            counters: updated,
        })
    }
}
