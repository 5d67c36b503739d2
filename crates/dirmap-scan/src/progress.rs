//! Walk progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::aggregate::Aggregator;

/// Progress is broadcast after this many offered entries.
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Progress information during a walk.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Entries probed and offered to the inclusion callback.
    pub entries_processed: u64,
    /// Entries stored in the result collection.
    pub entries_recorded: u64,
    /// Sum of recorded regular-file sizes.
    pub bytes_recorded: u64,
    /// Failures recorded so far.
    pub failures: u64,
    /// Path examined most recently.
    pub current_path: PathBuf,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
    /// Set on the final snapshot of a run.
    pub finished: bool,
}

impl WalkProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            entries_processed: 0,
            entries_recorded: 0,
            bytes_recorded: 0,
            failures: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate walk rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_processed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for WalkProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            current_path: PathBuf::new(),
        }
    }

    pub fn set_current_path(&mut self, path: PathBuf) {
        self.current_path = path;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Whether a periodic snapshot is due after `processed` entries.
    pub fn is_due(processed: u64) -> bool {
        processed > 0 && processed % PROGRESS_INTERVAL == 0
    }

    pub fn snapshot(&self, aggregator: &Aggregator, finished: bool) -> WalkProgress {
        WalkProgress {
            entries_processed: aggregator.processed(),
            entries_recorded: aggregator.results().len() as u64,
            bytes_recorded: aggregator.total_size(),
            failures: aggregator.failures().len() as u64,
            current_path: self.current_path.clone(),
            elapsed: self.elapsed(),
            finished,
        }
    }
}
