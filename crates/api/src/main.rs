//! dunner-api binary: configuration, wiring, scheduler, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use dunner_api::{router, AppContext};
use dunner_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments configure the environment directly
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = dunner_infra::config::load().context("configuration loading failed")?;
    let context = AppContext::from_config(&config).context("context assembly failed")?;

    let mut scheduler = if config.sync.enabled {
        let mut scheduler = SyncScheduler::new(
            SyncSchedulerConfig {
                sync_cron: config.sync.sync_cron.clone(),
                reminder_cron: config.sync.reminder_cron.clone(),
                ..SyncSchedulerConfig::default()
            },
            Arc::clone(&context.sync),
            Arc::clone(&context.reminders),
        );
        scheduler.start().await.context("scheduler start failed")?;
        Some(scheduler)
    } else {
        warn!("scheduled sync is disabled; only manual runs are available");
        None
    };

    let listen_addr =
        std::env::var("DUNNER_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("cannot bind {listen_addr}"))?;
    info!(%listen_addr, "dunner api listening");

    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "scheduler did not stop cleanly");
        }
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}
