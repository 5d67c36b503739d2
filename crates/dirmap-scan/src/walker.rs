//! Session-based pre-order directory walker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use compact_str::CompactString;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use dirmap_core::{
    EntryKind, EntryRecord, FailureKind, Fingerprint, Ownership, ProcessIdentity, WalkConfig,
    WalkFailure, WalkOptions, DEFAULT_HASH_BUFFER_SIZE,
};

use crate::aggregate::{Aggregator, EntryMap, FailureMap, WalkSummary};
use crate::callback::{EntryFilter, FailureObserver, StopHandle};
use crate::classify::{classify, decode_permissions};
use crate::hash::fingerprint_file;
use crate::probe::{self, Probe};
use crate::progress::{ProgressTracker, WalkProgress};

/// Lifecycle state of a walk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to run.
    Unstarted,
    /// A walk is in progress.
    Running,
    /// A stop was requested; only [`DirMap::reset`] makes the session usable again.
    Stopped,
}

/// A directory whose children are still being iterated.
struct Frame {
    children: std::vec::IntoIter<PathBuf>,
}

/// Values fixed for the duration of one run.
struct WalkContext {
    root: PathBuf,
    options: WalkOptions,
}

/// Walk session: one traversal at a time, results kept until [`DirMap::reset`].
///
/// Traversal is depth-first and pre-order with an explicit stack. Every
/// entry is probed, classified, optionally fingerprinted and offered to the
/// inclusion callback before the next sibling is examined. A directory is
/// descended into whether or not the callback stored it.
///
/// Stop requests are observed only at descent boundaries: the siblings of
/// the directory being iterated are still examined, but no further
/// directory is listed.
pub struct DirMap {
    state: SessionState,
    stop: StopHandle,
    identity: ProcessIdentity,
    hash_buffer_size: usize,
    aggregator: Aggregator,
    root: Option<PathBuf>,
    elapsed: Duration,
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl DirMap {
    /// Create a session using the current process identity.
    pub fn new() -> Self {
        Self::with_identity(ProcessIdentity::current())
    }

    /// Create a session decoding process-user permissions for `identity`.
    pub fn with_identity(identity: ProcessIdentity) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            state: SessionState::Unstarted,
            stop: StopHandle::new(),
            identity,
            hash_buffer_size: DEFAULT_HASH_BUFFER_SIZE,
            aggregator: Aggregator::new(),
            root: None,
            elapsed: Duration::ZERO,
            progress_tx,
        }
    }

    /// Create a session from a walk configuration.
    pub fn from_config(config: &WalkConfig) -> Self {
        let mut dirmap = Self::with_identity(config.resolve_identity());
        dirmap.hash_buffer_size = config.hash_buffer_size;
        dirmap
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.stop.is_stopped() {
            SessionState::Stopped
        } else {
            self.state
        }
    }

    /// Identity used for process-user permissions.
    pub fn identity(&self) -> ProcessIdentity {
        self.identity
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// Request cooperative cancellation.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Handle for stopping the walk from inside a callback.
    ///
    /// Handles are invalidated by [`DirMap::reset`].
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Clear all collections and return to [`SessionState::Unstarted`].
    pub fn reset(&mut self) {
        self.aggregator.clear();
        self.stop = StopHandle::new();
        self.state = SessionState::Unstarted;
        self.root = None;
        self.elapsed = Duration::ZERO;
    }

    /// Walk the subtree at `root`.
    ///
    /// Returns `false` without doing anything unless the session is
    /// [`SessionState::Unstarted`]. Results accumulate on top of any previous
    /// run until [`DirMap::reset`] is called.
    pub async fn run<F, G>(
        &mut self,
        root: impl AsRef<Path>,
        options: WalkOptions,
        mut on_found: F,
        mut on_fail: G,
    ) -> bool
    where
        F: EntryFilter,
        G: FailureObserver,
    {
        if self.state() != SessionState::Unstarted {
            debug!(state = ?self.state(), "session not ready, ignoring run");
            return false;
        }
        self.state = SessionState::Running;

        let root = root.as_ref();
        let mut tracker = ProgressTracker::new();
        info!(
            root = %root.display(),
            fingerprints = options.compute_fingerprints,
            "starting walk"
        );

        match probe::absolutize(root) {
            Ok(root) => {
                self.root = Some(root.clone());
                let ctx = WalkContext { root, options };
                self.traverse(&ctx, &mut tracker, &mut on_found, &mut on_fail)
                    .await;
            }
            Err(error) => {
                self.fail(WalkFailure::new(root, FailureKind::Probe, error), &mut on_fail)
                    .await;
            }
        }

        self.elapsed = tracker.elapsed();
        self.state = SessionState::Unstarted;
        let _ = self
            .progress_tx
            .send(tracker.snapshot(&self.aggregator, true));

        info!(
            entries = self.aggregator.results().len(),
            failures = self.aggregator.failures().len(),
            total_size = self.aggregator.total_size(),
            stopped = self.stop.is_stopped(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "walk finished"
        );
        true
    }

    async fn traverse<F, G>(
        &mut self,
        ctx: &WalkContext,
        tracker: &mut ProgressTracker,
        on_found: &mut F,
        on_fail: &mut G,
    ) where
        F: EntryFilter,
        G: FailureObserver,
    {
        let Some(kind) = self
            .examine(ctx, &ctx.root, tracker, on_found, on_fail)
            .await
        else {
            return;
        };
        if !kind.is_dir() {
            return;
        }

        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.descend(&ctx.root, on_fail).await {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                stack.pop();
                continue;
            };

            let examined = self.examine(ctx, &child, tracker, on_found, on_fail).await;
            if examined.is_some_and(|kind| kind.is_dir()) {
                if let Some(frame) = self.descend(&child, on_fail).await {
                    stack.push(frame);
                }
            }
        }
    }

    /// Descent boundary: the only point where a stop request is observed.
    async fn descend<G>(&mut self, dir: &Path, on_fail: &mut G) -> Option<Frame>
    where
        G: FailureObserver,
    {
        if self.stop.is_stopped() {
            debug!(path = %dir.display(), "stop requested, not descending");
            return None;
        }

        debug!(path = %dir.display(), "descending");
        match probe::list_dir(dir).await {
            Ok(children) => Some(Frame {
                children: children.into_iter(),
            }),
            Err(error) => {
                self.fail(WalkFailure::new(dir, FailureKind::List, error), on_fail)
                    .await;
                None
            }
        }
    }

    /// Probe one entry and offer it to the inclusion callback.
    ///
    /// Returns the entry's kind, or `None` if it failed.
    async fn examine<F, G>(
        &mut self,
        ctx: &WalkContext,
        path: &Path,
        tracker: &mut ProgressTracker,
        on_found: &mut F,
        on_fail: &mut G,
    ) -> Option<EntryKind>
    where
        F: EntryFilter,
        G: FailureObserver,
    {
        tracker.set_current_path(path.to_path_buf());

        let probe = match probe::probe(path).await {
            Ok(probe) => probe,
            Err(error) => {
                let path = error.path().to_path_buf();
                self.fail(WalkFailure::new(path, FailureKind::Probe, error), on_fail)
                    .await;
                return None;
            }
        };

        let kind = classify(probe.metadata.mode);
        let fingerprint = if ctx.options.compute_fingerprints && kind.is_file() {
            match fingerprint_file(&probe.absolute_path, self.hash_buffer_size).await {
                Ok(fingerprint) => Some(fingerprint),
                Err(error) => {
                    let failure = WalkFailure::new(&probe.absolute_path, FailureKind::Hash, error);
                    self.fail(failure, on_fail).await;
                    return None;
                }
            }
        } else {
            None
        };

        let mut entry = self.assemble(ctx, probe, kind, fingerprint);
        let accepted = on_found.accept(&mut entry).await;
        self.aggregator.note_offered(accepted);
        if accepted {
            self.aggregator.record(entry);
        }

        if ProgressTracker::is_due(self.aggregator.processed()) {
            let _ = self
                .progress_tx
                .send(tracker.snapshot(&self.aggregator, false));
        }

        Some(kind)
    }

    fn assemble(
        &self,
        ctx: &WalkContext,
        probe: Probe,
        kind: EntryKind,
        fingerprint: Option<Fingerprint>,
    ) -> EntryRecord {
        let Probe {
            absolute_path,
            metadata,
        } = probe;

        let name = absolute_path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(absolute_path.to_string_lossy()));
        let relative_path = absolute_path
            .strip_prefix(&ctx.root)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let parent_path = absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| absolute_path.clone());

        EntryRecord {
            name,
            relative_path,
            base_path: ctx.root.clone(),
            parent_path,
            permissions: decode_permissions(&metadata, self.identity),
            owner: Ownership {
                uid: metadata.uid,
                gid: metadata.gid,
            },
            process: self.identity,
            kind,
            fingerprint,
            extra: serde_json::Map::new(),
            metadata,
            absolute_path,
        }
    }

    async fn fail<G>(&mut self, failure: WalkFailure, on_fail: &mut G)
    where
        G: FailureObserver,
    {
        warn!(
            path = %failure.absolute_path.display(),
            kind = %failure.kind,
            error = %failure.error,
            "walk failure"
        );
        on_fail.on_fail(&failure).await;
        self.aggregator.record_failure(failure);
    }

    /// Underlying collections.
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Every recorded entry, keyed by absolute path.
    pub fn results(&self) -> &EntryMap {
        self.aggregator.results()
    }

    /// Recorded entries of one kind.
    pub fn of_kind(&self, kind: EntryKind) -> &EntryMap {
        self.aggregator.of_kind(kind)
    }

    /// Recorded directories.
    pub fn directories(&self) -> &EntryMap {
        self.of_kind(EntryKind::Directory)
    }

    /// Recorded block devices.
    pub fn block_devices(&self) -> &EntryMap {
        self.of_kind(EntryKind::BlockDevice)
    }

    /// Recorded character devices.
    pub fn char_devices(&self) -> &EntryMap {
        self.of_kind(EntryKind::CharDevice)
    }

    /// Recorded named pipes.
    pub fn fifos(&self) -> &EntryMap {
        self.of_kind(EntryKind::Fifo)
    }

    /// Recorded regular files.
    pub fn files(&self) -> &EntryMap {
        self.of_kind(EntryKind::RegularFile)
    }

    /// Recorded sockets.
    pub fn sockets(&self) -> &EntryMap {
        self.of_kind(EntryKind::Socket)
    }

    /// Recorded symbolic links.
    pub fn symlinks(&self) -> &EntryMap {
        self.of_kind(EntryKind::Symlink)
    }

    /// Recorded entries of unrecognized type.
    pub fn others(&self) -> &EntryMap {
        self.of_kind(EntryKind::Other)
    }

    /// Recorded failures, keyed by absolute path.
    pub fn failures(&self) -> &FailureMap {
        self.aggregator.failures()
    }

    /// Sum of raw sizes of recorded regular files.
    pub fn total_size(&self) -> u64 {
        self.aggregator.total_size()
    }

    /// Look up a recorded entry.
    pub fn get(&self, path: &Path) -> Option<&Arc<EntryRecord>> {
        self.aggregator.get(path)
    }

    /// Aggregate counters for the collections as they stand.
    pub fn summary(&self) -> WalkSummary {
        self.aggregator.summary(self.root.clone(), self.elapsed)
    }
}

impl Default for DirMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{AcceptAll, IgnoreFailures};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    #[tokio::test]
    async fn test_basic_walk() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::new();

        assert!(
            dirmap
                .run(temp.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
                .await
        );

        assert_eq!(dirmap.results().len(), 8);
        assert_eq!(dirmap.directories().len(), 4);
        assert_eq!(dirmap.files().len(), 4);
        assert_eq!(dirmap.total_size(), 5 + 17 + 4 + 17);
        assert!(dirmap.failures().is_empty());
        assert_eq!(dirmap.state(), SessionState::Unstarted);
        assert!(dirmap.files().values().all(|e| e.fingerprint.is_none()));
    }

    #[tokio::test]
    async fn test_root_visited_first_and_once() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::new();
        let mut offered = Vec::new();

        dirmap
            .run(
                temp.path(),
                WalkOptions::default(),
                |entry: &mut EntryRecord| {
                    offered.push(entry.absolute_path.clone());
                    async { true }
                },
                IgnoreFailures,
            )
            .await;

        assert_eq!(offered[0], temp.path());
        assert_eq!(offered.iter().filter(|p| *p == temp.path()).count(), 1);
        assert_eq!(offered.len(), 8);
    }

    #[tokio::test]
    async fn test_preorder_children_follow_parent() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::new();
        let mut offered = Vec::new();

        dirmap
            .run(
                temp.path(),
                WalkOptions::default(),
                |entry: &mut EntryRecord| {
                    offered.push(entry.absolute_path.clone());
                    async { true }
                },
                IgnoreFailures,
            )
            .await;

        let root = temp.path();
        let position = |p: &str| offered.iter().position(|o| *o == root.join(p)).unwrap();
        assert!(position("dir1") < position("dir1/file2.txt"));
        assert!(position("dir1/subdir") < position("dir1/subdir/file3.txt"));
        assert!(position("dir2") < position("dir2/file4.txt"));
    }

    #[tokio::test]
    async fn test_entry_paths() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::with_identity(ProcessIdentity::new(4242, 4242));
        dirmap
            .run(temp.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
            .await;

        let root = temp.path();
        let file = dirmap.get(&root.join("dir1/subdir/file3.txt")).unwrap();
        assert_eq!(file.name, "file3.txt");
        assert_eq!(file.relative_path, PathBuf::from("dir1/subdir/file3.txt"));
        assert_eq!(file.base_path, root);
        assert_eq!(file.parent_path, root.join("dir1/subdir"));
        assert_eq!(file.process, ProcessIdentity::new(4242, 4242));
        assert_eq!(file.owner.uid, file.metadata.uid);

        let root_entry = dirmap.get(root).unwrap();
        assert_eq!(root_entry.relative_path, PathBuf::new());
        assert!(root_entry.is_dir());
    }

    #[tokio::test]
    async fn test_dotted_root_is_normalized() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("f.txt"), "data").unwrap();

        let mut dirmap = DirMap::new();
        dirmap
            .run(
                temp.path().join("sub").join(".."),
                WalkOptions::default(),
                AcceptAll,
                IgnoreFailures,
            )
            .await;

        assert_eq!(dirmap.results().len(), 3);
        assert!(dirmap.get(&temp.path().join("f.txt")).is_some());
        assert!(dirmap.get(&temp.path().join("sub")).is_some());

        let root_entry = dirmap.get(temp.path()).unwrap();
        assert_eq!(root_entry.parent_path, temp.path().parent().unwrap());
        assert_eq!(
            root_entry.name,
            temp.path().file_name().unwrap().to_string_lossy()
        );
        assert_eq!(dirmap.summary().root.as_deref(), Some(temp.path()));
    }

    #[tokio::test]
    async fn test_run_refused_while_stopped() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::new();
        dirmap.stop();

        assert_eq!(dirmap.state(), SessionState::Stopped);
        assert!(
            !dirmap
                .run(temp.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
                .await
        );
        assert!(dirmap.results().is_empty());

        dirmap.reset();
        assert!(
            dirmap
                .run(temp.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
                .await
        );
        assert_eq!(dirmap.results().len(), 8);
    }

    #[tokio::test]
    async fn test_runs_accumulate_without_reset() {
        let temp = create_test_tree();
        let other = TempDir::new().unwrap();
        fs::write(other.path().join("extra.txt"), "12").unwrap();

        let mut dirmap = DirMap::new();
        dirmap
            .run(temp.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
            .await;
        dirmap
            .run(other.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
            .await;

        assert_eq!(dirmap.results().len(), 10);
        assert_eq!(dirmap.total_size(), 43 + 2);
    }

    #[tokio::test]
    async fn test_file_root_is_recorded_without_listing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("only.txt");
        fs::write(&file, "abc").unwrap();

        let mut dirmap = DirMap::new();
        dirmap
            .run(&file, WalkOptions::with_fingerprints(), AcceptAll, IgnoreFailures)
            .await;

        assert_eq!(dirmap.results().len(), 1);
        assert_eq!(dirmap.files().len(), 1);
        assert!(dirmap.failures().is_empty());
        assert_eq!(
            dirmap.files()[&file].fingerprint.unwrap().to_hex(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[tokio::test]
    async fn test_progress_final_snapshot() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::new();
        let mut rx = dirmap.subscribe();

        dirmap
            .run(temp.path(), WalkOptions::default(), AcceptAll, IgnoreFailures)
            .await;

        let progress = rx.try_recv().unwrap();
        assert!(progress.finished);
        assert_eq!(progress.entries_processed, 8);
        assert_eq!(progress.entries_recorded, 8);
        assert_eq!(progress.bytes_recorded, 43);
    }

    #[tokio::test]
    async fn test_summary() {
        let temp = create_test_tree();
        let mut dirmap = DirMap::new();
        dirmap
            .run(
                temp.path(),
                WalkOptions::default(),
                |entry: &mut EntryRecord| {
                    let keep = entry.is_dir();
                    async move { keep }
                },
                IgnoreFailures,
            )
            .await;

        let summary = dirmap.summary();
        assert_eq!(summary.root.as_deref(), Some(temp.path()));
        assert_eq!(summary.total_directories, 4);
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.total_processed, 8);
        assert_eq!(summary.total_skipped, 4);
        assert_eq!(summary.total_size, 0);
        assert_eq!(summary.directories.len(), 4);
    }
}
