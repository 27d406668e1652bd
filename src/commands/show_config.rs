//! Config command implementation.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;

/// Print the effective (or default) configuration as YAML
pub async fn run(default: bool, config_path: &Path) -> Result<()> {
    if default {
        print!("{}", Config::generate_default_yaml());
        return Ok(());
    }

    let config = Config::load_or_default(config_path)?;
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
