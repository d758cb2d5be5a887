//! Abalone Age Prediction API - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_logging(&settings.log);

    info!("=== Abalone Age API v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(&settings).await
}
