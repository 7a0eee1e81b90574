use anyhow::Result;
use chrono::Duration;
use clap::{Arg, Command};
use kindred::{
    cache::TtlCache,
    db::{get_db_pool, DatabaseConfig, MemoryCounterStore, PgMatchStore, PgProfileStore, PgSwipeStore},
    services::PatternSweeper,
    utils::{init_logging, Clock, Config, RequestContext, SystemClock},
    DiscoveryService, Stores, Uuid,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("pattern-sweeper")
        .about("Periodically scan recent swipers for automated swiping patterns")
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single sweep and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("UUID")
                .help("Print the pattern report for one user and exit"),
        )
        .arg(
            Arg::new("interval-secs")
                .long("interval-secs")
                .value_parser(clap::value_parser!(u64))
                .help("Seconds between sweeps (overrides SWEEPER_INTERVAL_SECS)"),
        )
        .arg(
            Arg::new("lookback-minutes")
                .long("lookback-minutes")
                .value_parser(clap::value_parser!(i64))
                .help("Only scan users who swiped within this many minutes (overrides SWEEPER_LOOKBACK_MINUTES)"),
        )
        .get_matches();

    info!("🔎 Starting Kindred pattern sweeper...");

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let swipes = Arc::new(PgSwipeStore::new(pool.clone()));
    let stores = Stores {
        profiles: Arc::new(PgProfileStore::new(pool.clone())),
        swipes: swipes.clone(),
        matches: Arc::new(PgMatchStore::new(pool)),
        counters: Arc::new(MemoryCounterStore::new()),
        cache: Arc::new(TtlCache::new(clock.clone())),
    };
    let service = Arc::new(DiscoveryService::new(stores, &config.discovery, clock.clone()));

    if let Some(raw) = matches.get_one::<String>("user") {
        let user_id: Uuid = raw.parse()?;
        let report = service.analyse_pattern(&RequestContext::new(), user_id).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let interval = matches
        .get_one::<u64>("interval-secs")
        .map(|secs| std::time::Duration::from_secs(*secs))
        .unwrap_or(config.sweeper_interval);
    let lookback = matches
        .get_one::<i64>("lookback-minutes")
        .copied()
        .unwrap_or(config.sweeper_lookback_minutes);

    let sweeper = PatternSweeper::new(swipes, service, clock, Duration::minutes(lookback));

    if matches.get_flag("once") {
        let summary = sweeper.sweep_once(&RequestContext::new()).await?;
        info!(
            "📊 Scanned {} users, {} flagged, {} failed",
            summary.scanned,
            summary.flagged.len(),
            summary.failed
        );
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal.cancel(),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    info!(
        interval_secs = interval.as_secs(),
        lookback_minutes = lookback,
        "Sweeping recent swipers"
    );
    sweeper.run(interval, shutdown).await;

    Ok(())
}
