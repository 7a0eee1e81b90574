// =============================================================================
// Kindred Discovery Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location. Every value here is
// a default; `utils::config` lets the environment override the knobs.

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Swipes a user may make per rolling hour
pub const DEFAULT_SWIPES_PER_HOUR: u32 = 100;

/// Swipes a user may make per rolling day
pub const DEFAULT_SWIPES_PER_DAY: u32 = 1_000;

/// Super-likes a user may send per rolling day
pub const DEFAULT_SUPER_LIKES_PER_DAY: u32 = 5;

/// Discovery requests per rolling hour
pub const DEFAULT_DISCOVERY_PER_HOUR: u32 = 50;

/// Discovery requests per rolling day
pub const DEFAULT_DISCOVERY_PER_DAY: u32 = 500;

/// Length of the hourly window in seconds
pub const HOUR_WINDOW_SECS: i64 = 60 * 60;

/// Length of the daily window in seconds
pub const DAY_WINDOW_SECS: i64 = 24 * 60 * 60;

// =============================================================================
// CANDIDATE SELECTION
// =============================================================================

/// Maximum rows pulled from the profile store for one discovery computation
pub const DEFAULT_CANDIDATE_HARD_CAP: usize = 1_000;

/// Search radius used when the filter does not carry one
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// Youngest age a candidate may have
pub const MIN_CANDIDATE_AGE: u32 = 18;

/// Oldest age a candidate may have
pub const MAX_CANDIDATE_AGE: u32 = 100;

/// Mean Earth radius used by the Haversine distance
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Budget for the match check that follows a committed like, independent of
/// the request that triggered it
pub const MATCH_SETTLE_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// SCORING
// =============================================================================

pub const DEFAULT_DISTANCE_WEIGHT: f64 = 0.30;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.20;
pub const DEFAULT_COMPLETION_WEIGHT: f64 = 0.20;
pub const DEFAULT_VERIFICATION_WEIGHT: f64 = 0.15;
pub const DEFAULT_PREMIUM_WEIGHT: f64 = 0.15;

/// Distance at which the distance score reaches zero
pub const DISTANCE_SCORE_ZERO_KM: f64 = 100.0;

/// Last activity within this many hours scores full recency
pub const RECENT_ACTIVITY_HOURS: i64 = 24;

/// Last activity within this many hours scores half recency
pub const SEMI_RECENT_ACTIVITY_HOURS: i64 = 72;

/// Points awarded per present profile field when the profile is incomplete
pub const COMPLETION_POINTS_PER_FIELD: f64 = 20.0;

// =============================================================================
// CACHE TTLS
// =============================================================================

pub const DEFAULT_CANDIDATE_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_USER_MATCHES_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_MATCH_CACHE_TTL_SECS: u64 = 10 * 60;

/// Seconds between sweeps of expired cache entries and rate-limit counters
pub const DEFAULT_CACHE_PURGE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SWIPED_SET_TTL_SECS: u64 = 10 * 60;
pub const DEFAULT_STATS_TTL_SECS: u64 = 5 * 60;

// =============================================================================
// PAGINATION
// =============================================================================

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_DISCOVERY_PAGE_SIZE: u32 = 50;
pub const MAX_MATCHES_PAGE_SIZE: u32 = 100;
pub const MAX_HISTORY_LIMIT: u32 = 100;

// =============================================================================
// PATTERN ANALYSIS
// =============================================================================

/// How many of the most recent swipes the analyser looks at
pub const PATTERN_WINDOW_SWIPES: usize = 100;

/// Below this many swipes nothing is flagged
pub const PATTERN_MIN_SWIPES: usize = 10;

/// Mean interval under which swiping is considered automated
pub const PATTERN_MIN_MEAN_INTERVAL_MS: i64 = 1_000;

/// Like rate (percent) above which swiping is considered indiscriminate
pub const PATTERN_LIKE_RATE_THRESHOLD: f64 = 95.0;

/// Consecutive intervals closer than this are considered mechanical
pub const PATTERN_PERIODICITY_TOLERANCE_MS: i64 = 100;

/// Share of swipes in one clock hour that marks the pattern as clustered
pub const PATTERN_CLUSTER_SHARE: f64 = 0.5;

// =============================================================================
// SWEEPER
// =============================================================================

pub const DEFAULT_SWEEPER_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_SWEEPER_LOOKBACK_MINUTES: i64 = 60;
pub const SWEEPER_BATCH_LIMIT: usize = 500;

// =============================================================================
// DATABASE
// =============================================================================

/// Pool size when DB_MAX_CONNECTIONS is unset
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a pooled connection before giving up
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Tracing filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "kindred=info,tower_http=debug,server=debug,pattern_sweeper=debug,migrate=info";

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default per-request deadline in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Header carrying the authenticated caller's user ID
pub const USER_ID_HEADER: &str = "x-user-id";
