//! Per-address debouncing of reconciliation work.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Entries idle for longer than this many windows are forgotten.
const RETENTION_WINDOWS: u32 = 4;

/// Remembers when each address was last reconciled.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_processed: HashMap<String, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_processed: HashMap::new(),
        }
    }

    /// Whether `address` may be reconciled at `now`.
    ///
    /// Does not update any state: call [`record`](Self::record) once the
    /// address has actually been processed.
    pub fn should_process(&self, address: &str, now: Instant) -> bool {
        match self.last_processed.get(address) {
            Some(last) => now.saturating_duration_since(*last) >= self.window,
            None => true,
        }
    }

    pub fn record(&mut self, address: &str, now: Instant) {
        match self.last_processed.get_mut(address) {
            Some(last) => *last = now,
            None => {
                self.last_processed.insert(address.to_string(), now);
            }
        }
    }

    /// Forget addresses not processed within the retention period.
    /// Returns how many entries were dropped.
    pub fn prune(&mut self, now: Instant) -> usize {
        let retention = self
            .window
            .checked_mul(RETENTION_WINDOWS)
            .unwrap_or(Duration::MAX);
        let before = self.last_processed.len();
        self.last_processed
            .retain(|_, last| now.saturating_duration_since(*last) < retention);
        before - self.last_processed.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn len(&self) -> usize {
        self.last_processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_processed.is_empty()
    }
}
