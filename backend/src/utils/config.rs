use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;

/// Reads `key` from the environment, falling back to `default` when the
/// variable is unset or does not parse.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    pub swipes_per_hour: u32,
    pub swipes_per_day: u32,
    pub super_likes_per_day: u32,
    pub discovery_per_hour: u32,
    pub discovery_per_day: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            swipes_per_hour: DEFAULT_SWIPES_PER_HOUR,
            swipes_per_day: DEFAULT_SWIPES_PER_DAY,
            super_likes_per_day: DEFAULT_SUPER_LIKES_PER_DAY,
            discovery_per_hour: DEFAULT_DISCOVERY_PER_HOUR,
            discovery_per_day: DEFAULT_DISCOVERY_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheTtls {
    pub candidate_pool: Duration,
    pub user_matches: Duration,
    pub match_record: Duration,
    pub swiped_set: Duration,
    pub swipe_stats: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            candidate_pool: Duration::from_secs(DEFAULT_CANDIDATE_CACHE_TTL_SECS),
            user_matches: Duration::from_secs(DEFAULT_USER_MATCHES_CACHE_TTL_SECS),
            match_record: Duration::from_secs(DEFAULT_MATCH_CACHE_TTL_SECS),
            swiped_set: Duration::from_secs(DEFAULT_SWIPED_SET_TTL_SECS),
            swipe_stats: Duration::from_secs(DEFAULT_STATS_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub distance: f64,
    pub recency: f64,
    pub completion: f64,
    pub verification: f64,
    pub premium: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE_WEIGHT,
            recency: DEFAULT_RECENCY_WEIGHT,
            completion: DEFAULT_COMPLETION_WEIGHT,
            verification: DEFAULT_VERIFICATION_WEIGHT,
            premium: DEFAULT_PREMIUM_WEIGHT,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.distance + self.recency + self.completion + self.verification + self.premium
    }
}

/// Knobs consumed by the discovery core.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub rate_limits: RateLimits,
    pub cache_ttls: CacheTtls,
    pub weights: ScoreWeights,
    pub candidate_hard_cap: usize,
    pub default_max_distance_km: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            rate_limits: RateLimits::default(),
            cache_ttls: CacheTtls::default(),
            weights: ScoreWeights::default(),
            candidate_hard_cap: DEFAULT_CANDIDATE_HARD_CAP,
            default_max_distance_km: DEFAULT_MAX_DISTANCE_KM,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| Duration::from_secs(env_or(key, default.as_secs()));

        let weights = ScoreWeights {
            distance: env_or("DISTANCE_WEIGHT", defaults.weights.distance),
            recency: env_or("RECENCY_WEIGHT", defaults.weights.recency),
            completion: env_or("COMPLETION_WEIGHT", defaults.weights.completion),
            verification: env_or("VERIFICATION_WEIGHT", defaults.weights.verification),
            premium: env_or("PREMIUM_WEIGHT", defaults.weights.premium),
        };
        if (weights.total() - 1.0).abs() > 1e-6 {
            tracing::warn!(total = weights.total(), "Score weights do not sum to 1.0; scores may leave [0, 100]");
        }

        Self {
            rate_limits: RateLimits {
                swipes_per_hour: env_or("SWIPES_PER_HOUR", defaults.rate_limits.swipes_per_hour),
                swipes_per_day: env_or("SWIPES_PER_DAY", defaults.rate_limits.swipes_per_day),
                super_likes_per_day: env_or("SUPER_LIKES_PER_DAY", defaults.rate_limits.super_likes_per_day),
                discovery_per_hour: env_or("DISCOVERY_PER_HOUR", defaults.rate_limits.discovery_per_hour),
                discovery_per_day: env_or("DISCOVERY_PER_DAY", defaults.rate_limits.discovery_per_day),
            },
            cache_ttls: CacheTtls {
                candidate_pool: secs("CANDIDATE_CACHE_TTL_SECS", defaults.cache_ttls.candidate_pool),
                user_matches: secs("USER_MATCHES_CACHE_TTL_SECS", defaults.cache_ttls.user_matches),
                match_record: secs("MATCH_CACHE_TTL_SECS", defaults.cache_ttls.match_record),
                swiped_set: secs("SWIPED_SET_TTL_SECS", defaults.cache_ttls.swiped_set),
                swipe_stats: secs("STATS_TTL_SECS", defaults.cache_ttls.swipe_stats),
            },
            weights,
            candidate_hard_cap: env_or("CANDIDATE_HARD_CAP", defaults.candidate_hard_cap),
            default_max_distance_km: env_or("DEFAULT_MAX_DISTANCE_KM", defaults.default_max_distance_km),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub sweeper_interval: Duration,
    pub sweeper_lookback_minutes: i64,
    pub cache_purge_interval: Duration,
    pub discovery: DiscoveryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            port: env_or("PORT", DEFAULT_SERVER_PORT),
            request_timeout: Duration::from_millis(env_or("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)),
            sweeper_interval: Duration::from_secs(env_or("SWEEPER_INTERVAL_SECS", DEFAULT_SWEEPER_INTERVAL_SECS)),
            sweeper_lookback_minutes: env_or("SWEEPER_LOOKBACK_MINUTES", DEFAULT_SWEEPER_LOOKBACK_MINUTES),
            cache_purge_interval: Duration::from_secs(
                env_or("CACHE_PURGE_INTERVAL_SECS", DEFAULT_CACHE_PURGE_INTERVAL_SECS).max(1),
            ),
            discovery: DiscoveryConfig::from_env(),
        })
    }
}
