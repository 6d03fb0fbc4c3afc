use anyhow::Result;
use axum::{Router, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{Level, error, info, warn};

use banter_arena::api::{
    ContentApiState, DuelApiState, StatsApiState, UserApiState, create_content_router,
    create_duel_router, create_stats_router, create_user_router,
};
use banter_arena::{
    AuditLog, ContentStore, DatabasePool, DuelEngine, EngineConfig, Ledger, ModerationEngine,
    RatingEngine, StatsCollector,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - everything downstream receives immutable
    // slices of it at construction
    let config = Arc::new(EngineConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?);

    init_logging(&config)?;

    info!("Starting Banter Arena engagement engine");
    info!(
        "Duel settings: voting window {}s, minimum votes {}, sweep every {}s",
        config.duel.voting_window_secs, config.duel.min_votes, config.duel.resolve_interval_secs
    );

    // Connect storage when configured; the engines run in-memory otherwise
    let db = if config.database.postgres_enabled {
        let pool = DatabasePool::new(&config.database.postgres_url)
            .await
            .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
        pool.init_schema()
            .await
            .map_err(|e| anyhow::anyhow!("Schema initialization failed: {}", e))?;
        Some(Arc::new(pool))
    } else {
        warn!("Running without PostgreSQL; state is in-memory only");
        None
    };

    // Build the engines, leaf to root
    let mut ledger = Ledger::new(&config.ranks);
    let mut audit = AuditLog::new();
    if let Some(ref db) = db {
        ledger = ledger.with_database(db.clone());
        audit = audit.with_database(db.clone());
    }
    let ledger = Arc::new(ledger);
    let audit = Arc::new(audit);

    let mut content = ContentStore::new(&config.content, ledger.clone());
    if let Some(ref db) = db {
        content = content.with_database(db.clone());
    }
    let content = Arc::new(content);

    let moderation = Arc::new(ModerationEngine::new(
        content.clone(),
        ledger.clone(),
        audit.clone(),
        &config.points,
    ));

    let mut rating = RatingEngine::new(content.clone(), ledger.clone(), &config.points);
    if let Some(ref db) = db {
        rating = rating.with_database(db.clone());
    }
    let rating = Arc::new(rating);

    let mut duels = DuelEngine::new(
        content.clone(),
        ledger.clone(),
        audit.clone(),
        &config.duel,
        &config.points,
    );
    if let Some(ref db) = db {
        duels = duels.with_database(db.clone());
    }
    let duels = Arc::new(duels);

    if db.is_some() {
        content
            .sync_sequence()
            .await
            .map_err(|e| anyhow::anyhow!("Content sequence sync failed: {}", e))?;
        duels
            .sync_sequence()
            .await
            .map_err(|e| anyhow::anyhow!("Duel sequence sync failed: {}", e))?;
    }

    let stats = Arc::new(StatsCollector::new(
        ledger.clone(),
        content.clone(),
        duels.clone(),
    ));

    // Periodic sweep resolving duels whose voting window has elapsed
    spawn_duel_resolver(duels.clone(), config.duel.resolve_interval_secs);

    // Daily statistics rollup
    spawn_stats_rollup(stats.clone());

    // Build the application with nested routers
    let app = Router::new()
        .nest(
            "/content",
            create_content_router(ContentApiState {
                content: content.clone(),
                moderation: moderation.clone(),
                rating: rating.clone(),
            }),
        )
        .nest("/duels", create_duel_router(DuelApiState { duels: duels.clone() }))
        .nest("/users", create_user_router(UserApiState { ledger: ledger.clone() }))
        .nest(
            "/stats",
            create_stats_router(StatsApiState {
                stats: stats.clone(),
                audit: audit.clone(),
            }),
        )
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Banter Arena server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging from configuration
fn init_logging(config: &EngineConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

/// The external expiry trigger: a periodic task invoking the resolve sweep
fn spawn_duel_resolver(duels: Arc<DuelEngine>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            let resolved = duels.resolve_expired(chrono::Utc::now()).await;
            if !resolved.is_empty() {
                info!(count = resolved.len(), "Resolved expired duels");
            }
        }
    });
}

/// Daily read-only aggregate rollup, logged for operators
fn spawn_stats_rollup(stats: Arc<StatsCollector>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        // The first tick fires immediately and logs the startup snapshot
        loop {
            interval.tick().await;
            let snapshot = stats.snapshot().await;
            match serde_json::to_string(&snapshot) {
                Ok(json) => info!(stats = %json, "Daily statistics rollup"),
                Err(e) => error!("Failed to serialize statistics rollup: {}", e),
            }
        }
    });
}
