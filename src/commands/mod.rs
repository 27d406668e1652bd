//! CLI command implementations.

pub mod check;
pub mod once;
pub mod run;
pub mod show_config;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::fetcher::{AdminSocket, ControlAddress};
use crate::fs_abstraction::{real_fs, FileSystem, RealFileSystem};
use crate::lock::LockGuard;
use crate::monitor::Monitor;

/// Shared startup of `run` and `once`: make sure the output directory
/// exists, take the writer lock, build the monitor.
fn start_monitor(config: &Config) -> Result<(LockGuard, Monitor)> {
    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            real_fs()
                .create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let lock = LockGuard::acquire(&config.lock_path())?;

    let source = AdminSocket::new(ControlAddress::parse(&config.control_socket), &config.table);
    let monitor = Monitor::from_config(config, Box::new(source), Box::new(RealFileSystem));

    Ok((lock, monitor))
}
