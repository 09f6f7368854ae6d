//! Debounced form-to-store updates.
//!
//! The properties panel writes on every keystroke; pushing each one
//! into the store would spam history snapshots. [`FieldCoalescer`]
//! keeps only the latest pending value per field and releases them
//! once a fixed quiet interval has passed since the last write.
//! Time is injected explicitly so the policy is testable without
//! timers.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

pub struct FieldCoalescer {
    quiet: Duration,
    pending: FxHashMap<String, String>,
    last_write: Option<Instant>,
}

impl FieldCoalescer {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: FxHashMap::default(),
            last_write: None,
        }
    }

    /// Record a field change. Later writes to the same field replace
    /// earlier ones, and every write restarts the quiet interval.
    pub fn write(&mut self, field: impl Into<String>, value: impl Into<String>, now: Instant) {
        self.pending.insert(field.into(), value.into());
        self.last_write = Some(now);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// When the next flush would be due, if anything is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.has_pending()
            .then(|| self.last_write.map(|at| at + self.quiet))
            .flatten()
    }

    /// Take the pending changes if the quiet interval has elapsed.
    /// Returns `None` while writes are still settling.
    pub fn flush(&mut self, now: Instant) -> Option<Vec<(String, String)>> {
        let due = self.deadline()?;
        if now < due {
            return None;
        }
        self.last_write = None;
        Some(self.pending.drain().collect())
    }

    /// Take the pending changes unconditionally, e.g. on focus loss.
    pub fn flush_now(&mut self) -> Vec<(String, String)> {
        self.last_write = None;
        self.pending.drain().collect()
    }
}
