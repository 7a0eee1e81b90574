//! Contracts the discovery core consumes from its storage collaborators.
//!
//! PostgreSQL adapters live next to this module (`profiles`, `swipes`,
//! `matches`); `memory` provides lock-based in-process adapters with the
//! same guarantees.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    CandidateQuery, CanonicalPair, Coordinates, Match, MatchInsert, StatsWindows, Swipe, SwipeDirection, SwipeStats,
    UserProfile,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to user profiles. Rows returned by the search methods are
/// always active and not banned.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Profiles for `ids`, in no particular order; unknown IDs are skipped.
    async fn get_many(&self, ids: &[Uuid]) -> StoreResult<Vec<UserProfile>>;

    /// Profiles other than `requester` within `radius_km` of `center`
    /// matching `query`, nearest first.
    async fn by_location(
        &self,
        requester: &UserProfile,
        center: Coordinates,
        radius_km: f64,
        query: &CandidateQuery,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<UserProfile>>;

    /// Profiles other than `requester` matching `query` regardless of
    /// location, most recently active first.
    async fn by_preferences(
        &self,
        requester: &UserProfile,
        query: &CandidateQuery,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<UserProfile>>;

    async fn update_last_active(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
}

/// Append-only swipe storage. `insert` rejects duplicates per ordered pair
/// with [`StoreError::DuplicateSwipe`] and self-swipes with [`StoreError::SelfSwipe`].
#[async_trait]
pub trait SwipeStore: Send + Sync {
    async fn insert(&self, swipe: &Swipe) -> StoreResult<()>;

    async fn exists(&self, swiper_id: Uuid, swiped_id: Uuid) -> StoreResult<bool>;

    async fn direction(&self, swiper_id: Uuid, swiped_id: Uuid) -> StoreResult<Option<SwipeDirection>>;

    /// Swipes made by `user_id`, newest first.
    async fn list(&self, user_id: Uuid, limit: usize, offset: usize) -> StoreResult<Vec<Swipe>>;

    /// Every user `user_id` has swiped on. Swipes received are not included.
    async fn swiped_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn stats(&self, user_id: Uuid, windows: StatsWindows) -> StoreResult<SwipeStats>;

    /// Users with at least one swipe at or after `since`.
    async fn recent_swipers(&self, since: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Uuid>>;
}

/// Match storage keyed by canonical pair.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Match>>;

    async fn get_pair(&self, pair: CanonicalPair) -> StoreResult<Option<Match>>;

    /// Inserts `record` unless a match for its pair already exists. Must be
    /// atomic with respect to concurrent calls for the same pair.
    async fn insert_if_absent(&self, record: &Match) -> StoreResult<MatchInsert>;

    async fn update(&self, record: &Match) -> StoreResult<()>;

    /// Active matches involving `user_id`, newest first.
    async fn list(&self, user_id: Uuid, limit: usize, offset: usize) -> StoreResult<Vec<Match>>;

    async fn count(&self, user_id: Uuid) -> StoreResult<i64>;
}

/// One counter that must stay below `limit` within `window`.
#[derive(Debug, Clone)]
pub struct CounterSlot {
    pub key: String,
    pub limit: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    pub count: u32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireOutcome {
    pub acquired: bool,
    /// One entry per slot, in slot order. Post-increment when acquired.
    pub counters: Vec<CounterState>,
}

/// TTL-bearing counters. `try_acquire` increments every slot in one atomic
/// step if and only if every slot is below its limit; otherwise nothing
/// changes. A counter's TTL starts at its first increment.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn try_acquire(&self, slots: &[CounterSlot], now: DateTime<Utc>) -> StoreResult<AcquireOutcome>;
}
