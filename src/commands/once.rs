//! Once command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Run a single poll cycle and print what it did
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let (_lock, mut monitor) = super::start_monitor(&config)?;

    let report = monitor.run_cycle().await;

    println!();
    println!(" Samples:     {}", report.samples);
    println!(" Suppressed:  {}", report.suppressed);
    println!(" Allowed:     {}", report.allowed);
    println!(" Blocked:     {}", report.blocked);
    println!(
        " Tables:      {} allowed, {} blocked (max {})",
        monitor.engine().allowed().len(),
        monitor.engine().blocked().len(),
        config.max_rows
    );
    println!(" Output:      {}", config.output.display());
    println!();

    Ok(())
}
