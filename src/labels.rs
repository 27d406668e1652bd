//! Decorative address labels (country codes).
//!
//! The database is a JSON object mapping a country code to its ranges:
//!
//! ```json
//! { "fr": ["2.0.0.0/12", "5.39.0.0/17"], "de": ["5.1.0.0/16"] }
//! ```
//!
//! Lookups never fail: anything that goes wrong yields an empty label.

use ipnet::IpNet;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use tracing::{info, warn};

use crate::fs_abstraction::FileSystem;

#[cfg(test)]
use mockall::automock;

/// Source of decorative labels for addresses.
#[cfg_attr(test, automock)]
pub trait LabelAnnotator: Send + Sync {
    /// Short label for `address`, or an empty string when unknown.
    fn label_for(&self, address: &str) -> String;
}

/// Annotator used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLabels;

impl LabelAnnotator for NoLabels {
    fn label_for(&self, _address: &str) -> String {
        String::new()
    }
}

/// In-memory country database.
#[derive(Debug, Default, Clone)]
pub struct CountryDatabase {
    ranges: Vec<(IpNet, String)>,
}

impl CountryDatabase {
    /// Parse the JSON database. Invalid ranges and non-alphabetic codes are
    /// skipped.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(content)?;

        let ranges = raw
            .into_iter()
            .filter(|(code, _)| !code.is_empty() && code.chars().all(|c| c.is_ascii_alphabetic()))
            .flat_map(|(code, nets)| {
                let code = code.to_ascii_lowercase();
                nets.into_iter()
                    .filter_map(|n| n.trim().parse::<IpNet>().ok())
                    .map(move |net| (net, code.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(Self { ranges })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl LabelAnnotator for CountryDatabase {
    fn label_for(&self, address: &str) -> String {
        let Ok(addr) = address.parse::<IpAddr>() else {
            return String::new();
        };
        self.ranges
            .iter()
            .find(|(net, _)| net.contains(&addr))
            .map(|(_, code)| code.clone())
            .unwrap_or_default()
    }
}

/// Build the annotator for an optional database path.
///
/// A missing, unreadable or corrupt database disables labels with a
/// warning; it never stops the monitor.
pub fn load_annotator(fs: &dyn FileSystem, path: Option<&Path>) -> Box<dyn LabelAnnotator> {
    let Some(path) = path else {
        return Box::new(NoLabels);
    };

    let content = match fs.read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Label database {} unavailable: {}", path.display(), e);
            return Box::new(NoLabels);
        }
    };

    match CountryDatabase::parse(&content) {
        Ok(db) => {
            info!("Loaded {} labelled ranges from {}", db.len(), path.display());
            Box::new(db)
        }
        Err(e) => {
            warn!("Label database {} is invalid: {}", path.display(), e);
            Box::new(NoLabels)
        }
    }
}
