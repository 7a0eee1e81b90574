use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::constants::*;
use crate::models::{CandidateQuery, UserProfile, VerificationLevel};
use crate::utils::config::ScoreWeights;
use crate::utils::geo::distance_between;

/// Per-factor scores, each in [0, 100], and their weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub recency: f64,
    pub completion: f64,
    pub verification: f64,
    pub premium: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub profile: UserProfile,
    pub score: f64,
    pub distance_km: Option<f64>,
}

/// The gate every candidate passes before it is scored.
pub fn meets_basic_criteria(
    requester: &UserProfile,
    candidate: &UserProfile,
    query: &CandidateQuery,
    today: NaiveDate,
) -> bool {
    candidate.id != requester.id
        && candidate.is_discoverable()
        && query.admits_gender(candidate.gender)
        && candidate
            .age_on(today)
            .is_some_and(|age| (MIN_CANDIDATE_AGE..=MAX_CANDIDATE_AGE).contains(&age))
}

pub fn distance_score(distance_km: Option<f64>) -> f64 {
    match distance_km {
        Some(km) => (100.0 * (1.0 - km / DISTANCE_SCORE_ZERO_KM)).clamp(0.0, 100.0),
        None => 0.0,
    }
}

pub fn recency_score(last_active_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_active) = last_active_at else {
        return 0.0;
    };
    let idle = now.signed_duration_since(last_active);
    if idle <= chrono::Duration::hours(RECENT_ACTIVITY_HOURS) {
        100.0
    } else if idle <= chrono::Duration::hours(SEMI_RECENT_ACTIVITY_HOURS) {
        50.0
    } else {
        0.0
    }
}

pub fn completion_score(profile: &UserProfile) -> f64 {
    if profile.profile_complete {
        100.0
    } else {
        COMPLETION_POINTS_PER_FIELD * profile.present_field_count() as f64
    }
}

pub fn verification_score(level: VerificationLevel) -> f64 {
    match level {
        VerificationLevel::None => 0.0,
        VerificationLevel::Selfie => 50.0,
        VerificationLevel::Document => 100.0,
    }
}

pub fn premium_score(is_premium: bool) -> f64 {
    if is_premium { 100.0 } else { 0.0 }
}

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    weights: ScoreWeights,
}

impl Scorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn breakdown(&self, requester: &UserProfile, candidate: &UserProfile, now: DateTime<Utc>) -> ScoreBreakdown {
        let distance = distance_score(distance_between(requester.location, candidate.location));
        let recency = recency_score(candidate.last_active_at, now);
        let completion = completion_score(candidate);
        let verification = verification_score(candidate.verification_level);
        let premium = premium_score(candidate.is_premium);

        let total = distance * self.weights.distance
            + recency * self.weights.recency
            + completion * self.weights.completion
            + verification * self.weights.verification
            + premium * self.weights.premium;

        ScoreBreakdown {
            distance,
            recency,
            completion,
            verification,
            premium,
            total: total.clamp(0.0, 100.0),
        }
    }

    /// Gates, scores and sorts `candidates`: score descending, then
    /// candidate ID ascending, so equal inputs always rank identically.
    pub fn rank(
        &self,
        requester: &UserProfile,
        query: &CandidateQuery,
        candidates: Vec<UserProfile>,
        now: DateTime<Utc>,
    ) -> Vec<RankedCandidate> {
        let today = now.date_naive();
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter(|c| meets_basic_criteria(requester, c, query, today))
            .map(|profile| RankedCandidate {
                score: self.breakdown(requester, &profile, now).total,
                distance_km: distance_between(requester.location, profile.location),
                profile,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.profile.id.cmp(&b.profile.id))
        });
        ranked
    }
}

/// The `[offset, offset + limit)` window of `items`.
pub fn paginate<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, DiscoveryFilter, Gender};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap()
    }

    fn adult(id: u128) -> UserProfile {
        let mut p = UserProfile::new(Uuid::from_u128(id));
        p.birth_date = NaiveDate::from_ymd_opt(1995, 1, 1);
        p.gender = Some(Gender::Female);
        p
    }

    fn open_query() -> CandidateQuery {
        CandidateQuery::resolve(&DiscoveryFilter::default(), &[], 50.0)
    }

    #[test]
    fn test_distance_score_is_linear() {
        assert_eq!(distance_score(Some(0.0)), 100.0);
        assert_eq!(distance_score(Some(25.0)), 75.0);
        assert_eq!(distance_score(Some(100.0)), 0.0);
        assert_eq!(distance_score(Some(250.0)), 0.0);
        assert_eq!(distance_score(None), 0.0);
    }

    #[test]
    fn test_recency_bands() {
        assert_eq!(recency_score(Some(now() - Duration::hours(24)), now()), 100.0);
        assert_eq!(recency_score(Some(now() - Duration::hours(25)), now()), 50.0);
        assert_eq!(recency_score(Some(now() - Duration::hours(72)), now()), 50.0);
        assert_eq!(recency_score(Some(now() - Duration::hours(73)), now()), 0.0);
        assert_eq!(recency_score(None, now()), 0.0);
    }

    #[test]
    fn test_completion_points_per_field() {
        let mut p = adult(1);
        assert_eq!(completion_score(&p), 40.0);
        p.first_name = Some("Ada".into());
        p.interested_in = vec![Gender::Male];
        assert_eq!(completion_score(&p), 80.0);
        p.profile_complete = true;
        assert_eq!(completion_score(&p), 100.0);
    }

    #[test]
    fn test_full_marks() {
        let scorer = Scorer::new(ScoreWeights::default());
        let mut requester = adult(1);
        requester.location = Some(Coordinates {
            latitude: 40.0,
            longitude: -74.0,
        });
        let mut candidate = adult(2);
        candidate.location = requester.location;
        candidate.last_active_at = Some(now());
        candidate.profile_complete = true;
        candidate.verification_level = VerificationLevel::Document;
        candidate.is_premium = true;

        let score = scorer.breakdown(&requester, &candidate, now());
        assert!((score.total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_gate_rejects_self_banned_and_minors() {
        let requester = adult(1);
        let query = open_query();
        let today = now().date_naive();

        assert!(!meets_basic_criteria(&requester, &requester, &query, today));

        let mut banned = adult(2);
        banned.is_banned = true;
        assert!(!meets_basic_criteria(&requester, &banned, &query, today));

        let mut minor = adult(3);
        minor.birth_date = NaiveDate::from_ymd_opt(2010, 1, 1);
        assert!(!meets_basic_criteria(&requester, &minor, &query, today));

        assert!(meets_basic_criteria(&requester, &adult(4), &query, today));
    }

    #[test]
    fn test_equal_scores_tie_break_on_id() {
        let scorer = Scorer::new(ScoreWeights::default());
        let requester = adult(1);
        let ranked = scorer.rank(&requester, &open_query(), vec![adult(9), adult(3), adult(5)], now());
        let ids: Vec<u128> = ranked.iter().map(|r| r.profile.id.as_u128()).collect();
        assert_eq!(ids, vec![3, 5, 9]);
    }

    #[test]
    fn test_paginate_window() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(&items, 8, 5), vec![8, 9]);
        assert!(paginate(&items, 20, 5).is_empty());
    }
}
