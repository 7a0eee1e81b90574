pub mod candidates;
pub mod discovery;
pub mod janitor;
pub mod ledger;
pub mod match_detector;
pub mod pattern_analyzer;
pub mod rate_limiter;
pub mod scoring;
pub mod sweeper;

pub use discovery::{DiscoveryService, Stores, SwipeAck, SwipeRequest};
pub use janitor::{CacheJanitor, PurgeSummary};
pub use match_detector::MatchOutcome;
pub use pattern_analyzer::PatternReport;
pub use rate_limiter::{RateAction, RateDecision, RateLimiter};
pub use sweeper::PatternSweeper;
