use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::services::rate_limiter::RateAction;

/// Failures raised by store and cache adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("swipe already recorded for this pair")]
    DuplicateSwipe,

    #[error("swiper and swiped user are the same")]
    SelfSwipe,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("invalid key pattern: {0}")]
    KeyPattern(#[from] regex::Error),
}

/// Errors surfaced by the discovery and matching core.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("rate limit exceeded for {action}; resets at {reset_at}")]
    RateLimitExceeded {
        action: RateAction,
        remaining: u32,
        reset_at: DateTime<Utc>,
    },

    #[error("rate limiter unavailable: {0}")]
    RateLimitUnavailable(String),

    #[error("user has already swiped on this profile")]
    DuplicateSwipe,

    #[error("users cannot swipe on themselves")]
    SelfSwipe,

    #[error("{0} not found")]
    NotFound(String),

    #[error("not permitted: {0}")]
    Forbidden(String),

    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out")]
    TimedOut,
}

impl DiscoveryError {
    /// Wraps a store failure with the name of the operation that issued it.
    pub fn store(operation: &'static str) -> impl FnOnce(StoreError) -> DiscoveryError {
        move |source| DiscoveryError::Store { operation, source }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, DiscoveryError::Cancelled | DiscoveryError::TimedOut)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            DiscoveryError::DuplicateSwipe | DiscoveryError::SelfSwipe => StatusCode::BAD_REQUEST,
            DiscoveryError::NotFound(_) => StatusCode::NOT_FOUND,
            DiscoveryError::Forbidden(_) => StatusCode::FORBIDDEN,
            DiscoveryError::RateLimitUnavailable(_)
            | DiscoveryError::Store { .. }
            | DiscoveryError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            DiscoveryError::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Message safe to show a client; store internals never leak.
    pub fn public_message(&self) -> String {
        match self {
            DiscoveryError::RateLimitUnavailable(_) | DiscoveryError::Store { .. } => {
                "Service temporarily unavailable. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}
