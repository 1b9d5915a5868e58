//! calbridge: iCalendar synchronization service.
//!
//! Wires the SQLite repositories, the HTTP feed fetcher and the cron
//! scheduler into the axum API, then serves until interrupted.

use std::sync::Arc;
use std::time::Duration;

use calbridge_core::{Clock, FeedPublisher, SubscriptionRegistry, SyncService, TransferService};
use calbridge_infra::{
    DbManager, FeedSyncScheduler, FeedSyncSchedulerConfig, HttpFeedFetcher,
    SqliteEventRepository, SqliteFeedTokenRepository, SqliteSubscriptionRegistry, SystemClock,
};
use calbridge_server::{build_router, AppContext};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = calbridge_infra::config::load()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
    db.run_migrations()?;

    let events = Arc::new(SqliteEventRepository::new(db.pool()));
    let subscriptions: Arc<dyn SubscriptionRegistry> =
        Arc::new(SqliteSubscriptionRegistry::new(db.pool()));
    let tokens = Arc::new(SqliteFeedTokenRepository::new(db.pool()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let fetcher = Arc::new(HttpFeedFetcher::new(Duration::from_secs(
        config.sync.fetch_timeout_secs,
    ))?);

    let sync = Arc::new(SyncService::new(
        fetcher,
        events.clone(),
        subscriptions.clone(),
        clock.clone(),
    ));
    let transfer = Arc::new(TransferService::new(events.clone(), clock.clone()));
    let publisher = Arc::new(FeedPublisher::new(tokens.clone(), events, clock.clone()));

    let mut scheduler = None;
    if config.sync.enabled {
        let mut s = FeedSyncScheduler::with_config(
            FeedSyncSchedulerConfig {
                cron_expression: config.sync.cron_expression.clone(),
                interval_secs: config.sync.interval_secs,
                max_concurrent: config.sync.max_concurrent,
                ..Default::default()
            },
            sync.clone(),
            subscriptions.clone(),
            clock,
        );
        s.start().await?;
        info!(cron = %config.sync.cron_expression, "feed sync scheduler started");
        scheduler = Some(s);
    } else {
        info!("feed sync scheduler disabled by configuration");
    }

    let context = AppContext {
        db,
        sync,
        transfer,
        publisher,
        subscriptions,
        tokens,
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, build_router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.stop().await {
            warn!(error = %e, "scheduler did not stop cleanly");
        }
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
