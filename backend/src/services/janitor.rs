use std::sync::Arc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::db::memory::MemoryCounterStore;
use crate::utils::clock::Clock;

/// Evicts expired entries from the in-process cache and rate-limit counters,
/// which reads alone only do for the key they touch.
pub struct CacheJanitor {
    cache: Arc<TtlCache>,
    counters: Arc<MemoryCounterStore>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    pub cache_entries: usize,
    pub counters: usize,
}

impl CacheJanitor {
    pub fn new(cache: Arc<TtlCache>, counters: Arc<MemoryCounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { cache, counters, clock }
    }

    pub async fn purge_once(&self) -> PurgeSummary {
        PurgeSummary {
            cache_entries: self.cache.purge_expired(),
            counters: self.counters.purge_expired(self.clock.now()).await,
        }
    }

    /// Purges every `interval` until `shutdown` fires.
    pub async fn run(&self, interval: std::time::Duration, shutdown: CancellationToken) {
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Cache janitor stopping");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let purged = self.purge_once().await;
            debug!(
                cache_entries = purged.cache_entries,
                counters = purged.counters,
                remaining = self.cache.len(),
                "Expired entries purged"
            );
        }
    }
}
