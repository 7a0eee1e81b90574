use axum::http::{HeaderValue, Method};
use axum::Router;
use kindred::{
    cache::TtlCache,
    db::{self, DatabaseConfig, MemoryCounterStore, PgMatchStore, PgProfileStore, PgSwipeStore},
    get_db_pool,
    handlers::{self, AppState},
    services::CacheJanitor,
    utils::{self, Clock, SystemClock},
    Config, DiscoveryService, Stores,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    db::migrations::run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let counters = Arc::new(MemoryCounterStore::new());
    let cache = Arc::new(TtlCache::new(clock.clone()));
    let stores = Stores {
        profiles: Arc::new(PgProfileStore::new(pool.clone())),
        swipes: Arc::new(PgSwipeStore::new(pool.clone())),
        matches: Arc::new(PgMatchStore::new(pool)),
        counters: counters.clone(),
        cache: cache.clone(),
    };
    let service = Arc::new(DiscoveryService::new(stores, &config.discovery, clock.clone()));

    let shutdown = CancellationToken::new();
    let janitor = CacheJanitor::new(cache, counters, clock);
    let purge_interval = config.cache_purge_interval;
    let janitor_shutdown = shutdown.clone();
    tokio::spawn(async move { janitor.run(purge_interval, janitor_shutdown).await });

    let state = AppState {
        service,
        request_timeout: config.request_timeout,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("Server running on port {}", config.port);

    axum::serve(listener, app).await?;
    shutdown.cancel();

    Ok(())
}

fn create_router(state: AppState) -> Router {
    handlers::router(state)
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn create_cors_layer() -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    // ALLOWED_ORIGINS is a comma separated list; unset means permissive
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| origin.parse().ok())
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            cors = cors.allow_origin(Any);
        }
    } else {
        cors = cors.allow_origin(Any);
    }

    cors
}
