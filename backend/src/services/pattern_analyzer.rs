use chrono::Timelike;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::*;
use crate::error::DiscoveryError;
use crate::models::Swipe;
use crate::services::ledger::SwipeLedger;
use crate::utils::context::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionReason {
    RapidSwiping,
    IndiscriminateLiking,
    MechanicalPeriodicity,
}

/// Advisory summary of a user's recent swiping behaviour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub user_id: Uuid,
    pub total: usize,
    pub like_rate: f64,
    pub avg_interval_seconds: f64,
    pub time_pattern: String,
    pub suspicious: bool,
    pub reasons: Vec<SuspicionReason>,
}

/// Builds a report from swipes in any order. Only the most recent
/// [`PATTERN_WINDOW_SWIPES`] are considered.
pub fn analyse_swipes(user_id: Uuid, swipes: &[Swipe]) -> PatternReport {
    let mut window: Vec<&Swipe> = swipes.iter().collect();
    window.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    window.truncate(PATTERN_WINDOW_SWIPES);
    window.reverse();

    let total = window.len();
    let positive = window.iter().filter(|s| s.direction.is_positive()).count();
    let like_rate = if total > 0 {
        positive as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let intervals_ms: Vec<i64> = window
        .windows(2)
        .map(|pair| (pair[1].created_at - pair[0].created_at).num_milliseconds())
        .collect();
    let mean_interval_ms = if intervals_ms.is_empty() {
        0.0
    } else {
        intervals_ms.iter().sum::<i64>() as f64 / intervals_ms.len() as f64
    };

    let mut reasons = Vec::new();
    if total >= PATTERN_MIN_SWIPES {
        if !intervals_ms.is_empty() && mean_interval_ms < PATTERN_MIN_MEAN_INTERVAL_MS as f64 {
            reasons.push(SuspicionReason::RapidSwiping);
        }
        if like_rate > PATTERN_LIKE_RATE_THRESHOLD && like_rate < 100.0 {
            reasons.push(SuspicionReason::IndiscriminateLiking);
        }
        if is_periodic(&intervals_ms) {
            reasons.push(SuspicionReason::MechanicalPeriodicity);
        }
    }

    PatternReport {
        user_id,
        total,
        like_rate,
        avg_interval_seconds: mean_interval_ms / 1000.0,
        time_pattern: time_pattern(&window),
        suspicious: !reasons.is_empty(),
        reasons,
    }
}

/// Three consecutive intervals that each differ from the previous one by
/// less than the tolerance.
fn is_periodic(intervals_ms: &[i64]) -> bool {
    intervals_ms.windows(3).any(|run| {
        (run[0] - run[1]).abs() < PATTERN_PERIODICITY_TOLERANCE_MS
            && (run[1] - run[2]).abs() < PATTERN_PERIODICITY_TOLERANCE_MS
    })
}

fn time_pattern(swipes: &[&Swipe]) -> String {
    let mut per_hour = [0usize; 24];
    for swipe in swipes {
        per_hour[swipe.created_at.hour() as usize] += 1;
    }

    let busiest = per_hour
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)));
    match busiest {
        Some((hour, &count)) if count as f64 > swipes.len() as f64 * PATTERN_CLUSTER_SHARE => {
            format!("clustered_{}", hour)
        }
        _ => "distributed".to_string(),
    }
}

pub struct PatternAnalyzer {
    ledger: Arc<SwipeLedger>,
}

impl PatternAnalyzer {
    pub fn new(ledger: Arc<SwipeLedger>) -> Self {
        Self { ledger }
    }

    pub async fn analyse(&self, ctx: &RequestContext, user_id: Uuid) -> Result<PatternReport, DiscoveryError> {
        let recent = self.ledger.history(ctx, user_id, PATTERN_WINDOW_SWIPES, 0).await?;
        Ok(analyse_swipes(user_id, &recent))
    }
}
