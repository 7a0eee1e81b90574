pub mod connection;
pub mod matches;
pub mod memory;
pub mod migrations;
pub mod profiles;
pub mod stores;
pub mod swipes;

pub use connection::{get_db_pool, DatabaseConfig};
pub use matches::PgMatchStore;
pub use memory::{MemoryCounterStore, MemoryMatchStore, MemoryProfileStore, MemorySwipeStore};
pub use profiles::PgProfileStore;
pub use stores::{CounterStore, MatchStore, ProfileStore, SwipeStore};
pub use swipes::PgSwipeStore;
