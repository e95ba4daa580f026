use anyhow::Context;
use melony_sync::{init_logging, AppConfig, SyncEngine};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let engine = SyncEngine::new(AppConfig::from_env())
        .await
        .context("failed to initialize sync engine")?;
    engine.start().await;

    info!("melony-sync running; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutting down; waiting for in-flight reconciliation");
    engine.shutdown().await;
    Ok(())
}
