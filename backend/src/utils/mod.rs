pub mod clock;
pub mod config;
pub mod context;
pub mod fingerprint;
pub mod geo;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, DiscoveryConfig};
pub use context::RequestContext;
pub use logging::init_logging;
