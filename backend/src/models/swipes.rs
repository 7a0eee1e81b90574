use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Like,
    Pass,
    SuperLike,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Pass => "pass",
            SwipeDirection::SuperLike => "super_like",
        }
    }

    /// Super-likes count as likes for matching and like-rate purposes.
    pub fn is_positive(&self) -> bool {
        matches!(self, SwipeDirection::Like | SwipeDirection::SuperLike)
    }
}

impl FromStr for SwipeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(SwipeDirection::Like),
            "pass" => Ok(SwipeDirection::Pass),
            "super_like" => Ok(SwipeDirection::SuperLike),
            other => Err(format!("unknown swipe direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swipe {
    pub id: Uuid,
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub direction: SwipeDirection,
    pub created_at: DateTime<Utc>,
}

impl Swipe {
    pub fn new(swiper_id: Uuid, swiped_id: Uuid, direction: SwipeDirection, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            swiper_id,
            swiped_id,
            direction,
            created_at,
        }
    }
}

/// Cut-off instants for the windowed swipe counters.
#[derive(Debug, Clone, Copy)]
pub struct StatsWindows {
    pub day_start: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
}

impl StatsWindows {
    /// Today since UTC midnight, the week and month as trailing 7 and 30 days.
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);
        Self {
            day_start,
            week_start: now - Duration::days(7),
            month_start: now - Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwipeStats {
    pub total_swipes: i64,
    pub likes: i64,
    pub passes: i64,
    pub super_likes: i64,
    pub swipes_today: i64,
    pub swipes_this_week: i64,
    pub swipes_this_month: i64,
    pub like_rate: f64,
}

impl SwipeStats {
    pub fn with_like_rate(mut self) -> Self {
        self.like_rate = if self.total_swipes > 0 {
            (self.likes + self.super_likes) as f64 / self.total_swipes as f64 * 100.0
        } else {
            0.0
        };
        self
    }
}
