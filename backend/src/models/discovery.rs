use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_CANDIDATE_AGE, MIN_CANDIDATE_AGE};
use crate::models::users::{Gender, UserProfile};

/// Caller-supplied discovery filter. Every field is optional; absent fields
/// fall back to the requester's stored preferences or the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub interested_in: Vec<Gender>,
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default)]
    pub with_photos_only: bool,
    #[serde(default)]
    pub excluded_ids: Vec<Uuid>,
}

/// A filter with every default applied. This is what the candidate source
/// and the filter fingerprint operate on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateQuery {
    pub min_age: u32,
    pub max_age: u32,
    pub max_distance_km: f64,
    pub interested_in: BTreeSet<Gender>,
    pub verified_only: bool,
    pub with_photos_only: bool,
}

impl CandidateQuery {
    pub fn resolve(filter: &DiscoveryFilter, requester_interests: &[Gender], default_distance_km: f64) -> Self {
        let min_age = filter.min_age.unwrap_or(MIN_CANDIDATE_AGE).max(MIN_CANDIDATE_AGE);
        let max_age = filter.max_age.unwrap_or(MAX_CANDIDATE_AGE).min(MAX_CANDIDATE_AGE);
        let interested_in = if filter.interested_in.is_empty() {
            requester_interests.iter().copied().collect()
        } else {
            filter.interested_in.iter().copied().collect()
        };
        let max_distance_km = filter
            .max_distance_km
            .filter(|km| km.is_finite() && *km > 0.0)
            .unwrap_or(default_distance_km);

        Self {
            min_age,
            max_age,
            max_distance_km,
            interested_in,
            verified_only: filter.verified_only,
            with_photos_only: filter.with_photos_only,
        }
    }

    /// An empty interest set admits every gender.
    pub fn admits_gender(&self, gender: Option<Gender>) -> bool {
        if self.interested_in.is_empty() {
            return true;
        }
        gender.is_some_and(|g| self.interested_in.contains(&g))
    }

    pub fn admits_age(&self, age: Option<u32>) -> bool {
        age.is_some_and(|a| a >= self.min_age && a <= self.max_age)
    }

    /// Gender, age, verification and photo predicates. Activity and ban
    /// status are checked separately.
    pub fn admits_profile(&self, profile: &UserProfile, today: NaiveDate) -> bool {
        self.admits_gender(profile.gender)
            && self.admits_age(profile.age_on(today))
            && (!self.verified_only || profile.verification_level.is_verified())
            && (!self.with_photos_only || profile.has_photos)
    }
}

/// Page number (1-based) and page size after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, size: Option<u32>, max_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max_size),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.size as usize
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub user_id: Uuid,
    pub score: f64,
}

/// Cached value for one candidate-pool page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePoolSnapshot {
    pub candidates: Vec<ScoredCandidate>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredProfile {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub distance_km: Option<f64>,
    pub is_verified: bool,
    pub is_premium: bool,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryPage {
    pub candidates: Vec<DiscoveredProfile>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub from_cache: bool,
}
