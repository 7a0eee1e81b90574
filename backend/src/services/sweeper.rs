use chrono::Duration;
use std::sync::Arc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::constants::SWEEPER_BATCH_LIMIT;
use crate::db::stores::SwipeStore;
use crate::error::DiscoveryError;
use crate::services::discovery::DiscoveryService;
use crate::services::pattern_analyzer::PatternReport;
use crate::utils::clock::Clock;
use crate::utils::context::RequestContext;

#[derive(Debug, Default)]
pub struct SweepSummary {
    pub scanned: usize,
    pub failed: usize,
    pub flagged: Vec<PatternReport>,
}

/// Runs pattern analysis out-of-band over everyone who swiped recently.
/// Reports are advisory: suspicious users are logged, nothing is enforced.
pub struct PatternSweeper {
    swipes: Arc<dyn SwipeStore>,
    service: Arc<DiscoveryService>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
}

impl PatternSweeper {
    pub fn new(
        swipes: Arc<dyn SwipeStore>,
        service: Arc<DiscoveryService>,
        clock: Arc<dyn Clock>,
        lookback: Duration,
    ) -> Self {
        Self {
            swipes,
            service,
            clock,
            lookback,
        }
    }

    pub async fn sweep_once(&self, ctx: &RequestContext) -> Result<SweepSummary, DiscoveryError> {
        let since = self.clock.now() - self.lookback;
        let users = ctx
            .guard(async {
                self.swipes
                    .recent_swipers(since, SWEEPER_BATCH_LIMIT)
                    .await
                    .map_err(DiscoveryError::store("recent swiper scan"))
            })
            .await?;

        let mut summary = SweepSummary::default();
        for user_id in users {
            ctx.check()?;
            summary.scanned += 1;
            match self.service.analyse_pattern(ctx, user_id).await {
                Ok(report) if report.suspicious => {
                    warn!(
                        user_id = %user_id,
                        total = report.total,
                        like_rate = report.like_rate,
                        avg_interval_seconds = report.avg_interval_seconds,
                        time_pattern = %report.time_pattern,
                        reasons = ?report.reasons,
                        "Suspicious swipe pattern"
                    );
                    summary.flagged.push(report);
                }
                Ok(_) => {}
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    error!(user_id = %user_id, error = %e, "Pattern analysis failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Sweeps every `interval` until `shutdown` fires.
    pub async fn run(&self, interval: std::time::Duration, shutdown: CancellationToken) {
        let mut ticker = time::interval(interval);
        let mut iteration: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Pattern sweeper stopping");
                    return;
                }
                _ = ticker.tick() => {}
            }
            iteration += 1;

            let ctx = RequestContext::with_token(shutdown.child_token());
            match self.sweep_once(&ctx).await {
                Ok(summary) => info!(
                    iteration,
                    scanned = summary.scanned,
                    flagged = summary.flagged.len(),
                    failed = summary.failed,
                    "Pattern sweep finished"
                ),
                Err(e) if e.is_cancellation() => {
                    info!("Pattern sweep interrupted");
                    return;
                }
                Err(e) => error!(iteration, error = %e, "Pattern sweep failed"),
            }
        }
    }
}
