//! Run command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Run the monitor until the process is terminated
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let (lock, mut monitor) = super::start_monitor(&config)?;

    info!(
        "gatewatch {} watching table '{}' on {}",
        env!("CARGO_PKG_VERSION"),
        config.table,
        config.control_socket
    );
    info!("Holding lock {}", lock.path().display());

    monitor.run(config.poll()).await;
    Ok(())
}
