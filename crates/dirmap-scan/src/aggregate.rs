//! Result collections for a walk session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

use dirmap_core::{EntryKind, EntryRecord, WalkFailure};

/// Collection of entries keyed by absolute path, in insertion order.
pub type EntryMap = IndexMap<PathBuf, Arc<EntryRecord>>;

/// Collection of failures keyed by absolute path.
pub type FailureMap = IndexMap<PathBuf, WalkFailure>;

/// Owns every collection filled during a walk.
///
/// Each recorded path lives in exactly one per-kind collection, and
/// `total_size` is the sum of sizes in the regular-file collection.
#[derive(Debug, Default)]
pub struct Aggregator {
    results: EntryMap,
    by_kind: [EntryMap; 8],
    failures: FailureMap,
    total_size: u64,
    processed: u64,
    skipped: u64,
}

fn slot(kind: EntryKind) -> usize {
    match kind {
        EntryKind::Directory => 0,
        EntryKind::BlockDevice => 1,
        EntryKind::CharDevice => 2,
        EntryKind::Fifo => 3,
        EntryKind::RegularFile => 4,
        EntryKind::Socket => 5,
        EntryKind::Symlink => 6,
        EntryKind::Other => 7,
    }
}

impl Aggregator {
    /// Create empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an accepted entry.
    ///
    /// Re-recording a path replaces the earlier entry in every collection.
    pub fn record(&mut self, entry: EntryRecord) {
        let entry = Arc::new(entry);
        let path = entry.absolute_path.clone();

        if let Some(previous) = self.results.insert(path.clone(), Arc::clone(&entry)) {
            self.by_kind[slot(previous.kind)].shift_remove(&path);
            if previous.is_file() {
                self.total_size -= previous.size();
            }
        }

        if entry.is_file() {
            self.total_size += entry.size();
        }
        self.by_kind[slot(entry.kind)].insert(path, entry);
    }

    /// Insert a failure, replacing any earlier failure for the same path.
    pub fn record_failure(&mut self, failure: WalkFailure) {
        self.failures.insert(failure.absolute_path.clone(), failure);
    }

    /// Count an entry offered to the inclusion callback.
    pub fn note_offered(&mut self, accepted: bool) {
        self.processed += 1;
        if !accepted {
            self.skipped += 1;
        }
    }

    /// Drop all collections and counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Every recorded entry.
    pub fn results(&self) -> &EntryMap {
        &self.results
    }

    /// Recorded entries of one kind.
    pub fn of_kind(&self, kind: EntryKind) -> &EntryMap {
        &self.by_kind[slot(kind)]
    }

    /// Look up a recorded entry by absolute path.
    pub fn get(&self, path: &Path) -> Option<&Arc<EntryRecord>> {
        self.results.get(path)
    }

    /// Recorded failures.
    pub fn failures(&self) -> &FailureMap {
        &self.failures
    }

    /// Sum of raw sizes of recorded regular files.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Entries offered to the inclusion callback.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Entries the inclusion callback rejected.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Build a summary of the current collections.
    pub fn summary(&self, root: Option<PathBuf>, elapsed: Duration) -> WalkSummary {
        WalkSummary {
            root,
            total_size: self.total_size,
            total_files: self.of_kind(EntryKind::RegularFile).len() as u64,
            total_directories: self.of_kind(EntryKind::Directory).len() as u64,
            total_entries: self.results.len() as u64,
            total_processed: self.processed,
            total_skipped: self.skipped,
            total_failures: self.failures.len() as u64,
            directories: self.of_kind(EntryKind::Directory).keys().cloned().collect(),
            elapsed,
        }
    }
}

/// Aggregate counters for a walk.
#[derive(Debug, Clone, Serialize)]
pub struct WalkSummary {
    /// Resolved root of the last run.
    pub root: Option<PathBuf>,
    pub total_size: u64,
    pub total_files: u64,
    pub total_directories: u64,
    /// Recorded entries of any kind.
    pub total_entries: u64,
    /// Entries successfully probed and offered to the inclusion callback.
    pub total_processed: u64,
    /// Entries rejected by the inclusion callback.
    pub total_skipped: u64,
    pub total_failures: u64,
    /// Recorded directory paths.
    pub directories: Vec<PathBuf>,
    /// Wall-clock duration of the last run.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use dirmap_core::{FailureKind, ProbeError};

    #[test]
    fn test_record_partitions_by_kind() {
        let mut agg = Aggregator::new();
        agg.record(record("/r", EntryKind::Directory, 0));
        agg.record(record("/r/a", EntryKind::RegularFile, 10));
        agg.record(record("/r/b", EntryKind::RegularFile, 5));
        agg.record(record("/r/p", EntryKind::Fifo, 0));

        assert_eq!(agg.results().len(), 4);
        assert_eq!(agg.of_kind(EntryKind::Directory).len(), 1);
        assert_eq!(agg.of_kind(EntryKind::RegularFile).len(), 2);
        assert_eq!(agg.of_kind(EntryKind::Fifo).len(), 1);
        assert_eq!(agg.total_size(), 15);

        let sum: usize = EntryKind::ALL.iter().map(|k| agg.of_kind(*k).len()).sum();
        assert_eq!(sum, agg.results().len());
    }

    #[test]
    fn test_rerecord_keeps_partition_and_size() {
        let mut agg = Aggregator::new();
        agg.record(record("/r/x", EntryKind::RegularFile, 100));
        agg.record(record("/r/x", EntryKind::RegularFile, 40));
        assert_eq!(agg.total_size(), 40);
        assert_eq!(agg.of_kind(EntryKind::RegularFile).len(), 1);

        agg.record(record("/r/x", EntryKind::Directory, 4096));
        assert_eq!(agg.total_size(), 0);
        assert!(agg.of_kind(EntryKind::RegularFile).is_empty());
        assert_eq!(agg.of_kind(EntryKind::Directory).len(), 1);
        assert_eq!(agg.results().len(), 1);
    }

    #[test]
    fn test_failure_overwrites_same_path() {
        let mut agg = Aggregator::new();
        let path = PathBuf::from("/r/locked");
        agg.record_failure(WalkFailure::new(
            &path,
            FailureKind::Probe,
            ProbeError::PermissionDenied { path: path.clone() },
        ));
        agg.record_failure(WalkFailure::new(
            &path,
            FailureKind::List,
            ProbeError::NotFound { path: path.clone() },
        ));

        assert_eq!(agg.failures().len(), 1);
        assert_eq!(agg.failures()[&path].kind, FailureKind::List);
    }

    #[test]
    fn test_clear_and_summary() {
        let mut agg = Aggregator::new();
        agg.record(record("/r", EntryKind::Directory, 0));
        agg.record(record("/r/f", EntryKind::RegularFile, 7));
        agg.note_offered(true);
        agg.note_offered(true);
        agg.note_offered(false);

        let summary = agg.summary(Some(PathBuf::from("/r")), Duration::ZERO);
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.total_processed, 3);
        assert_eq!(summary.total_skipped, 1);
        assert_eq!(summary.directories, vec![PathBuf::from("/r")]);

        agg.clear();
        assert!(agg.results().is_empty());
        assert_eq!(agg.total_size(), 0);
        assert_eq!(agg.processed(), 0);
    }
}
