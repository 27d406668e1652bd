//! The poll loop: fetch, parse, reconcile, publish.

use chrono::Local;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::config::Config;
use crate::engine::{CycleReport, Engine, EngineSettings};
use crate::fetcher::SnapshotSource;
use crate::fs_abstraction::FileSystem;
use crate::labels::load_annotator;
use crate::lists::NetworkList;
use crate::render::publish;
use crate::snapshot::{parse_snapshot, ConnectionSample};
use crate::state::TableState;

pub struct Monitor {
    engine: Engine,
    source: Box<dyn SnapshotSource>,
    fs: Box<dyn FileSystem>,
    output: PathBuf,
    state_file: Option<PathBuf>,
}

impl Monitor {
    pub fn new(
        engine: Engine,
        source: Box<dyn SnapshotSource>,
        fs: Box<dyn FileSystem>,
        output: PathBuf,
        state_file: Option<PathBuf>,
    ) -> Self {
        Self {
            engine,
            source,
            fs,
            output,
            state_file,
        }
    }

    /// Build a monitor from configuration: load the lists and the label
    /// database, then restore saved tables if any.
    pub fn from_config(
        config: &Config,
        source: Box<dyn SnapshotSource>,
        fs: Box<dyn FileSystem>,
    ) -> Self {
        let classifier = load_classifier(fs.as_ref(), config);
        let annotator = load_annotator(fs.as_ref(), config.label_database.as_deref());
        let mut engine = Engine::new(EngineSettings::from(config), classifier, annotator);

        if let Some(path) = &config.state_file {
            match TableState::load(fs.as_ref(), path) {
                Ok(state) => engine.restore(state),
                Err(e) => warn!("Ignoring saved tables: {}", e),
            }
        }

        Self::new(
            engine,
            source,
            fs,
            config.output.clone(),
            config.state_file.clone(),
        )
    }

    /// Fetch the current connection table; any failure is an empty poll.
    pub async fn poll(&self) -> Vec<ConnectionSample> {
        match self.source.fetch().await {
            Ok(raw) => parse_snapshot(&raw),
            Err(e) => {
                warn!("Failed to fetch connection table: {}", e);
                Vec::new()
            }
        }
    }

    /// Run one complete cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let samples = self.poll().await;
        let report = self
            .engine
            .reconcile(&samples, Instant::now(), Local::now());

        debug!(
            "Cycle: {} samples, {} suppressed, {} allowed, {} blocked",
            report.samples,
            report.suppressed,
            report.allowed,
            report.blocked
        );

        self.publish();
        report
    }

    /// Write the page, then the saved tables. Failures are logged and
    /// retried implicitly on the next cycle.
    pub fn publish(&self) {
        let document = self.engine.render();
        if let Err(e) = publish(self.fs.as_ref(), &self.output, &document) {
            error!("{}", e);
        }

        if let Some(path) = &self.state_file {
            if let Err(e) = self.engine.state().save(self.fs.as_ref(), path) {
                error!("Failed to save tables: {}", e);
            }
        }
    }

    /// Poll forever. A cycle that overruns the interval delays the next one;
    /// cycles are never skipped.
    pub async fn run(&mut self, poll_interval: Duration) {
        info!(
            "Monitoring every {:?}, writing {}",
            poll_interval,
            self.output.display()
        );

        // Publish right away so viewers get a page before the first poll lands
        self.publish();

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = self.run_cycle().await;
            if report.processed() > 0 {
                info!(
                    "Updated {} addresses ({} new); showing {} allowed, {} blocked",
                    report.processed(),
                    report.inserted,
                    self.engine.allowed().len(),
                    self.engine.blocked().len()
                );
            }
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// Load both network lists named by the configuration
pub fn load_classifier(fs: &dyn FileSystem, config: &Config) -> Classifier {
    let allow = NetworkList::load_or_empty(fs, &config.allowlist_file);
    let deny = NetworkList::load_or_empty(fs, &config.denylist_file);
    Classifier::new(allow, deny)
}
