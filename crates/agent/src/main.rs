//! Deploy Sentinel binary

use agent::{init_logging, install_metrics, run, AgentConfig, CONFIG_PATH_ENV};
use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .or_else(|| std::env::args().nth(1));
    let config = AgentConfig::load(path.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.logging)?;

    info!("=== Deploy Sentinel v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Monitoring {}", config.target_url);

    if config.metrics.enabled {
        install_metrics(&config.metrics)?;
    }

    run(config).await?;
    Ok(())
}
