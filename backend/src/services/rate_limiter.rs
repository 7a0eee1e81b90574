use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{DAY_WINDOW_SECS, HOUR_WINDOW_SECS};
use crate::db::stores::{CounterSlot, CounterStore};
use crate::error::DiscoveryError;
use crate::utils::clock::Clock;
use crate::utils::config::RateLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateAction {
    Swipe,
    SuperLike,
    Discovery,
}

impl RateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateAction::Swipe => "swipe",
            RateAction::SuperLike => "super_like",
            RateAction::Discovery => "discovery",
        }
    }
}

impl fmt::Display for RateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateWindow {
    Hour,
    Day,
}

impl RateWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateWindow::Hour => "hour",
            RateWindow::Day => "day",
        }
    }

    pub fn length(&self) -> Duration {
        match self {
            RateWindow::Hour => Duration::seconds(HOUR_WINDOW_SECS),
            RateWindow::Day => Duration::seconds(DAY_WINDOW_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    pub permitted: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

fn counter_key(user_id: Uuid, action: RateAction, window: RateWindow) -> String {
    format!("ratelimit:{}:{}:{}", action.as_str(), window.as_str(), user_id)
}

/// Fixed-length windows per (user, action) whose TTL starts at the first
/// increment. All of an action's windows are checked and incremented in one
/// atomic store call, so an operation counts against every window or none.
pub struct RateLimiter {
    counters: Arc<dyn CounterStore>,
    limits: RateLimits,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(counters: Arc<dyn CounterStore>, limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters,
            limits,
            clock,
        }
    }

    pub fn windows_for(&self, action: RateAction) -> Vec<(RateWindow, u32)> {
        match action {
            RateAction::Swipe => vec![
                (RateWindow::Hour, self.limits.swipes_per_hour),
                (RateWindow::Day, self.limits.swipes_per_day),
            ],
            RateAction::SuperLike => vec![(RateWindow::Day, self.limits.super_likes_per_day)],
            RateAction::Discovery => vec![
                (RateWindow::Hour, self.limits.discovery_per_hour),
                (RateWindow::Day, self.limits.discovery_per_day),
            ],
        }
    }

    /// Consumes one unit of `action` for `user_id` if every window has room.
    /// Store failures surface as [`DiscoveryError::RateLimitUnavailable`].
    pub async fn allow(&self, user_id: Uuid, action: RateAction) -> Result<RateDecision, DiscoveryError> {
        let windows = self.windows_for(action);
        let slots: Vec<CounterSlot> = windows
            .iter()
            .map(|(window, limit)| CounterSlot {
                key: counter_key(user_id, action, *window),
                limit: *limit,
                window: window.length(),
            })
            .collect();

        let now = self.clock.now();
        let outcome = self
            .counters
            .try_acquire(&slots, now)
            .await
            .map_err(|e| DiscoveryError::RateLimitUnavailable(e.to_string()))?;

        let per_window = slots.iter().zip(&outcome.counters);
        let decision = if outcome.acquired {
            per_window
                .map(|(slot, state)| RateDecision {
                    permitted: true,
                    remaining: slot.limit.saturating_sub(state.count),
                    reset_at: state.expires_at,
                })
                .min_by_key(|d| (d.remaining, d.reset_at))
        } else {
            // The caller must wait for the last exhausted window to roll over.
            per_window
                .filter(|(slot, state)| state.count >= slot.limit)
                .map(|(_, state)| RateDecision {
                    permitted: false,
                    remaining: 0,
                    reset_at: state.expires_at,
                })
                .max_by_key(|d| d.reset_at)
        };

        Ok(decision.unwrap_or(RateDecision {
            permitted: outcome.acquired,
            remaining: 0,
            reset_at: now,
        }))
    }

    /// Like [`RateLimiter::allow`], but a denial becomes
    /// [`DiscoveryError::RateLimitExceeded`].
    pub async fn enforce(&self, user_id: Uuid, action: RateAction) -> Result<RateDecision, DiscoveryError> {
        let decision = self.allow(user_id, action).await?;
        if !decision.permitted {
            tracing::info!(user_id = %user_id, action = %action, reset_at = %decision.reset_at, "Rate limit exceeded");
            return Err(DiscoveryError::RateLimitExceeded {
                action,
                remaining: decision.remaining,
                reset_at: decision.reset_at,
            });
        }
        Ok(decision)
    }
}
