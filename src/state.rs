//! Display table persistence across restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

use crate::error::WatchError;
use crate::fs_abstraction::FileSystem;
use crate::table::{DisplayRow, DisplayTable};

/// Saved content of both display tables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableState {
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allowed: Vec<DisplayRow>,
    #[serde(default)]
    pub blocked: Vec<DisplayRow>,
}

impl TableState {
    pub fn capture(allowed: &DisplayTable, blocked: &DisplayTable) -> Self {
        Self {
            saved_at: Some(Utc::now()),
            allowed: allowed.rows().cloned().collect(),
            blocked: blocked.rows().cloned().collect(),
        }
    }

    /// Load state from file. A missing file is an empty state.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, WatchError> {
        match fs.read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| WatchError::State(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(WatchError::State(format!("{}: {}", path.display(), e))),
        }
    }

    /// Save state to file atomically
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), WatchError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !fs.exists(parent) {
                fs.create_dir_all(parent)
                    .map_err(|e| WatchError::State(format!("{}: {}", parent.display(), e)))?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| WatchError::State(e.to_string()))?;
        fs.write_atomic(path, content.as_bytes())
            .map_err(|e| WatchError::State(format!("{}: {}", path.display(), e)))
    }
}
