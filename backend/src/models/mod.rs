pub mod discovery;
pub mod matches;
pub mod swipes;
pub mod users;

pub use discovery::{
    CandidatePoolSnapshot, CandidateQuery, DiscoveredProfile, DiscoveryFilter, DiscoveryPage, Pagination,
    ScoredCandidate,
};
pub use matches::{CanonicalPair, Match, MatchInsert, MatchPage};
pub use swipes::{StatsWindows, Swipe, SwipeDirection, SwipeStats};
pub use users::{Coordinates, Gender, UserProfile, VerificationLevel};
