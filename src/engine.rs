//! The reconciliation engine.
//!
//! One [`Engine`] is built at startup and owns every piece of mutable state:
//! the debounce map and both display tables. Lists and the label database
//! are read-only once it exists.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::classifier::{Classifier, Verdict};
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::labels::LabelAnnotator;
use crate::render::render_document;
use crate::snapshot::ConnectionSample;
use crate::state::TableState;
use crate::table::{DisplayTable, UpsertOutcome};

/// Static parameters of an engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub frontend: String,
    pub max_rows: usize,
    pub debounce_window: Duration,
    pub refresh: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            frontend: config.frontend.clone(),
            max_rows: config.max_rows,
            debounce_window: config.debounce(),
            refresh: config.refresh(),
        }
    }
}

/// What one reconciliation pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub samples: usize,
    pub suppressed: usize,
    pub allowed: usize,
    pub blocked: usize,
    pub inserted: usize,
    pub updated: usize,
    pub evicted: usize,
}

impl CycleReport {
    /// Addresses actually reconciled
    pub fn processed(&self) -> usize {
        self.allowed + self.blocked
    }
}

pub struct Engine {
    classifier: Classifier,
    annotator: Box<dyn LabelAnnotator>,
    debouncer: Debouncer,
    allowed: DisplayTable,
    blocked: DisplayTable,
    frontend: String,
    refresh: Duration,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        classifier: Classifier,
        annotator: Box<dyn LabelAnnotator>,
    ) -> Self {
        Self {
            classifier,
            annotator,
            debouncer: Debouncer::new(settings.debounce_window),
            allowed: DisplayTable::new(Verdict::Allowed, settings.max_rows),
            blocked: DisplayTable::new(Verdict::Blocked, settings.max_rows),
            frontend: settings.frontend,
            refresh: settings.refresh,
        }
    }

    /// Refill both tables from saved state.
    ///
    /// Every saved row is classified again with the current lists, so a row
    /// whose address changed sides since it was saved lands in the table it
    /// belongs to now.
    pub fn restore(&mut self, state: TableState) {
        let (allowed, blocked): (Vec<_>, Vec<_>) = state
            .allowed
            .into_iter()
            .chain(state.blocked)
            .partition(|row| self.classifier.classify(&row.address) == Verdict::Allowed);

        self.allowed.restore(allowed);
        self.blocked.restore(blocked);
        if !self.allowed.is_empty() || !self.blocked.is_empty() {
            debug!(
                "Restored {} allowed and {} blocked rows",
                self.allowed.len(),
                self.blocked.len()
            );
        }
    }

    /// Reconcile one poll's samples into the tables.
    ///
    /// `now` drives debouncing, `stamp` is the wall-clock time written in
    /// the rows.
    pub fn reconcile(
        &mut self,
        samples: &[ConnectionSample],
        now: Instant,
        stamp: DateTime<Local>,
    ) -> CycleReport {
        let mut report = CycleReport {
            samples: samples.len(),
            ..Default::default()
        };

        for sample in samples {
            if !self.debouncer.should_process(&sample.address, now) {
                report.suppressed += 1;
                continue;
            }
            self.debouncer.record(&sample.address, now);

            let verdict = self.classifier.classify(&sample.address);
            let label = self.annotator.label_for(&sample.address);
            let table = match verdict {
                Verdict::Allowed => {
                    report.allowed += 1;
                    &mut self.allowed
                }
                Verdict::Blocked => {
                    report.blocked += 1;
                    &mut self.blocked
                }
            };

            let outcome = table.upsert(
                &sample.address,
                stamp,
                sample.current_connections,
                sample.cumulative_connections,
                &self.frontend,
                label,
            );
            match outcome {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Updated => report.updated += 1,
                UpsertOutcome::Evicted => {
                    report.evicted += 1;
                    warn!(
                        "{} table is full ({} rows), not showing {}",
                        verdict,
                        table.max_rows(),
                        sample.address
                    );
                }
            }

            debug!(
                "{} {} cur={} cnt={} ({:?})",
                verdict,
                sample.address,
                sample.current_connections,
                sample.cumulative_connections,
                outcome
            );
        }

        let forgotten = self.debouncer.prune(now);
        if forgotten > 0 {
            debug!("Forgot {} idle addresses", forgotten);
        }

        report
    }

    /// Current status page
    pub fn render(&self) -> String {
        render_document(&self.allowed, &self.blocked, self.refresh)
    }

    pub fn state(&self) -> TableState {
        TableState::capture(&self.allowed, &self.blocked)
    }

    pub fn allowed(&self) -> &DisplayTable {
        &self.allowed
    }

    pub fn blocked(&self) -> &DisplayTable {
        &self.blocked
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn tracked_addresses(&self) -> usize {
        self.debouncer.len()
    }
}
