pub mod coherence;
pub mod keys;
pub mod store;

pub use coherence::CacheCoherence;
pub use store::{Cache, TtlCache};
