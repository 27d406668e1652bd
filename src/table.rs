//! Bounded, ordered display tables.
//!
//! Rows are keyed by the exact address string. Row order is first-insertion
//! order; updating a row never moves it. When a table is over capacity the
//! rows at the tail are dropped, so a full table keeps the addresses it
//! already shows and refuses new ones.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifier::Verdict;

/// Display bucket derived from the current connection count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Blocked,
}

impl Severity {
    /// Severity of a row in the table for `kind`.
    pub fn for_row(kind: Verdict, current_connections: u64) -> Self {
        match kind {
            Verdict::Blocked => Severity::Blocked,
            Verdict::Allowed => match current_connections {
                0..=1 => Severity::Low,
                2..=5 => Severity::Medium,
                _ => Severity::High,
            },
        }
    }

    /// CSS class used by the rendered page
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub timestamp: DateTime<Local>,
    pub address: String,
    pub frontend: String,
    pub current_connections: u64,
    pub cumulative_connections: u64,
    pub severity: Severity,
    /// Decorative label (country code), empty when unknown
    #[serde(default)]
    pub label: String,
}

/// What an upsert did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was appended
    Inserted,
    /// An existing row was updated in place
    Updated,
    /// A new row was appended and immediately evicted: the table is full
    Evicted,
}

#[derive(Debug, Clone)]
pub struct DisplayTable {
    kind: Verdict,
    max_rows: usize,
    rows: IndexMap<String, DisplayRow>,
}

impl DisplayTable {
    pub fn new(kind: Verdict, max_rows: usize) -> Self {
        Self {
            kind,
            max_rows,
            rows: IndexMap::new(),
        }
    }

    /// Insert or update the row for `address`, then enforce the row bound.
    pub fn upsert(
        &mut self,
        address: &str,
        now: DateTime<Local>,
        current: u64,
        cumulative: u64,
        frontend: &str,
        label: String,
    ) -> UpsertOutcome {
        let severity = Severity::for_row(self.kind, current);

        if let Some(row) = self.rows.get_mut(address) {
            row.timestamp = now;
            row.frontend = frontend.to_string();
            row.current_connections = current;
            row.cumulative_connections = cumulative;
            row.severity = severity;
            row.label = label;
            return UpsertOutcome::Updated;
        }

        self.rows.insert(
            address.to_string(),
            DisplayRow {
                timestamp: now,
                address: address.to_string(),
                frontend: frontend.to_string(),
                current_connections: current,
                cumulative_connections: cumulative,
                severity,
                label,
            },
        );

        if self.enforce_bound() > 0 && !self.rows.contains_key(address) {
            UpsertOutcome::Evicted
        } else {
            UpsertOutcome::Inserted
        }
    }

    /// Refill the table from previously saved rows, in order.
    ///
    /// Duplicate addresses keep their first position and last content;
    /// severities are recomputed for this table's kind.
    pub fn restore(&mut self, rows: impl IntoIterator<Item = DisplayRow>) {
        for mut row in rows {
            row.severity = Severity::for_row(self.kind, row.current_connections);
            self.rows.insert(row.address.clone(), row);
        }
        self.enforce_bound();
    }

    /// Drop rows past the limit from the tail. Returns how many were dropped.
    fn enforce_bound(&mut self) -> usize {
        let excess = self.rows.len().saturating_sub(self.max_rows);
        self.rows.truncate(self.max_rows);
        excess
    }

    pub fn get(&self, address: &str) -> Option<&DisplayRow> {
        self.rows.get(address)
    }

    pub fn rows(&self) -> impl Iterator<Item = &DisplayRow> {
        self.rows.values()
    }

    pub fn kind(&self) -> Verdict {
        self.kind
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
