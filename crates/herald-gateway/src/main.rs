use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use herald_channels::PlatformSet;
use herald_core::config::HeraldConfig;
use herald_distribution::{DistributionWorker, QueueStore, WorkerSettings};
use herald_realtime::{ConnectionRegistry, HeartbeatSweeper};
use herald_social::{FacebookPlatform, TwitterPlatform};
use herald_telegram::TelegramPlatform;
use tracing::info;

mod app;
mod auth;
mod http;

#[derive(Debug, Parser)]
#[command(name = "herald-gateway", version, about = "Herald live events and post distribution gateway")]
struct Cli {
    /// Config file (default: $HERALD_CONFIG, then ~/.herald/herald.toml).
    #[arg(long)]
    config: Option<String>,
    /// Override `gateway.bind`.
    #[arg(long)]
    bind: Option<String>,
    /// Override `gateway.port`.
    #[arg(long)]
    port: Option<u16>,
    /// Don't run the background distribution loop; batches only run through
    /// POST /distribution/process.
    #[arg(long)]
    no_worker: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_gateway=info,herald_distribution=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > HERALD_CONFIG env > ~/.herald/herald.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("HERALD_CONFIG").ok());
    let mut config = HeraldConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        HeraldConfig::default()
    });
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if cli.no_worker {
        config.distribution.worker_enabled = false;
    }

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store = QueueStore::new(db)?;
    info!("database migrations complete");

    // platform adapters: unconfigured ones stay registered and report
    // `configured: false` in /health
    let telegram = Arc::new(TelegramPlatform::new(config.platforms.telegram.clone()));
    let mut platforms = PlatformSet::new()
        .with_post_timeout(Duration::from_secs(config.distribution.adapter_timeout_secs));
    platforms.register(Arc::new(TwitterPlatform::new(config.platforms.twitter.clone())));
    platforms.register(Arc::new(FacebookPlatform::new(config.platforms.facebook.clone())));
    platforms.register(telegram.clone());
    for status in platforms.statuses() {
        info!(platform = %status.platform, configured = status.configured, "platform adapter registered");
    }

    let worker = Arc::new(DistributionWorker::new(
        store,
        Arc::new(platforms),
        WorkerSettings::from(&config.distribution),
    ));
    let registry = ConnectionRegistry::new(config.realtime.subscriber_buffer);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let sweeper = HeartbeatSweeper::new(
        registry.clone(),
        Duration::from_secs(config.realtime.heartbeat_interval_secs.max(1)),
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown_rx.clone()));

    let worker_task = if config.distribution.worker_enabled {
        Some(tokio::spawn(Arc::clone(&worker).run(shutdown_rx)))
    } else {
        info!("distribution worker disabled, batches run on demand only");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(config, registry.clone(), worker, telegram));
    let router = app::build_router(state);

    info!("Herald gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
            info!("shutdown requested");
            // open event streams never finish on their own
            let closed = registry.disconnect_all();
            info!(closed, "event streams closed");
        })
        .await?;

    // signal background loops to stop
    let _ = shutdown_tx.send(true);
    let _ = sweeper_task.await;
    if let Some(task) = worker_task {
        let _ = task.await;
    }
    info!("Herald gateway stopped");
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
