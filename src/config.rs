//! Configuration management for gatewatch.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on rows kept per table, whatever the configuration says.
const MAX_ROWS_LIMIT: usize = 10_000;

/// Longest accepted interval (one year)
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 86400);

/// Parse an interval such as "5s", "30m", "4h" or "1d".
/// Requires ASCII-only input to prevent Unicode-related edge cases
pub fn parse_interval(interval: &str) -> Option<Duration> {
    if !interval.is_ascii() || interval.len() < 2 {
        return None;
    }

    let (num_part, suffix) = interval.split_at(interval.len() - 1);
    let value = num_part.parse::<u64>().ok()?;

    let multiplier = match suffix {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return None,
    };

    Some(Duration::from_secs(value.checked_mul(multiplier)?))
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HAProxy admin socket: a Unix socket path or a `host:port` stats socket
    pub control_socket: String,

    /// Name of the stick table to query (`show table <name>`)
    pub table: String,

    /// Rendered status page
    pub output: PathBuf,

    /// Where the display tables are saved between restarts (optional)
    pub state_file: Option<PathBuf>,

    /// Frontend name shown in every row
    pub frontend: String,

    /// Allowed networks, one CIDR per line
    pub allowlist_file: PathBuf,

    /// Denied networks, one CIDR per line (takes precedence)
    pub denylist_file: PathBuf,

    /// Country database used to decorate addresses (optional)
    pub label_database: Option<PathBuf>,

    /// Browser auto-refresh interval embedded in the page
    pub refresh_interval: String,

    /// Time between two polls of the admin socket
    pub poll_interval: String,

    /// Minimum time between two reconciliations of the same address
    pub debounce_window: String,

    /// Maximum rows per table
    pub max_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_socket: "/run/haproxy/admin.sock".to_string(),
            table: "vpn".to_string(),
            output: PathBuf::from("/var/lib/haproxy/active_ips.html"),
            state_file: Some(PathBuf::from("/var/lib/gatewatch/tables.json")),
            frontend: "VPN".to_string(),
            allowlist_file: PathBuf::from("/etc/haproxy/geoip/whitelist.lst"),
            denylist_file: PathBuf::from("/etc/haproxy/geoip/blacklist.lst"),
            label_database: Some(PathBuf::from("/var/lib/gatewatch/countries.json")),
            refresh_interval: "300s".to_string(),
            poll_interval: "5s".to_string(),
            debounce_window: "5s".to_string(),
            max_rows: 100,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to built-in defaults when the file
    /// does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("refresh_interval", &self.refresh_interval),
            ("poll_interval", &self.poll_interval),
            ("debounce_window", &self.debounce_window),
        ] {
            match parse_interval(value) {
                Some(d) if !d.is_zero() && d <= MAX_INTERVAL => {}
                _ => anyhow::bail!(
                    "Invalid {} '{}'. Use format like '5s', '30m', '1h'",
                    name,
                    value
                ),
            }
        }

        if self.max_rows == 0 || self.max_rows > MAX_ROWS_LIMIT {
            anyhow::bail!(
                "Invalid max_rows {}. Must be between 1 and {}",
                self.max_rows,
                MAX_ROWS_LIMIT
            );
        }

        // The table name is spliced into the admin command line
        if self.table.is_empty()
            || self
                .table
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || c == ';')
        {
            anyhow::bail!("Invalid table name '{}'", self.table.escape_debug());
        }

        if self.control_socket.trim().is_empty() {
            anyhow::bail!("control_socket must not be empty");
        }

        Ok(())
    }

    pub fn refresh(&self) -> Duration {
        parse_interval(&self.refresh_interval).unwrap_or(Duration::from_secs(300))
    }

    pub fn poll(&self) -> Duration {
        parse_interval(&self.poll_interval).unwrap_or(Duration::from_secs(5))
    }

    pub fn debounce(&self) -> Duration {
        parse_interval(&self.debounce_window).unwrap_or(Duration::from_secs(5))
    }

    /// Lock file guarding the output against a second writer
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "gatewatch".into());
        name.push(".lock");
        self.output.with_file_name(name)
    }

    /// Generate default config with comments
    pub fn generate_default_yaml() -> String {
        include_str!("../templates/config.yaml").to_string()
    }
}
