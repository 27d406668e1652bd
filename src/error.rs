//! Error types for gatewatch.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Control channel error: {0}")]
    Fetch(String),

    #[error("Control channel timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to load network list {path}: {reason}")]
    ListLoad { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Render { path: String, reason: String },

    #[error("State file error: {0}")]
    State(String),
}
