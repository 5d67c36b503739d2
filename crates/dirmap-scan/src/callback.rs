//! Caller-supplied hooks invoked during a walk.
//!
//! Both hooks are awaited to completion before the walker moves on, so they
//! may perform their own asynchronous work.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use dirmap_core::{EntryRecord, WalkFailure};

/// Inclusion predicate offered every successfully probed entry.
///
/// The return value decides only whether the entry is stored. Rejecting a
/// directory never stops the walker from descending into it.
pub trait EntryFilter {
    /// Decide whether to store `entry`. The entry may be annotated through
    /// its `extra` slot before it is stored.
    fn accept(&mut self, entry: &mut EntryRecord) -> impl Future<Output = bool>;
}

/// Observer notified of every probe, list or hash failure.
///
/// Failures never abort the walk; use a [`StopHandle`] to end it early.
pub trait FailureObserver {
    fn on_fail(&mut self, failure: &WalkFailure) -> impl Future<Output = ()>;
}

impl<F, Fut> EntryFilter for F
where
    F: FnMut(&mut EntryRecord) -> Fut,
    Fut: Future<Output = bool>,
{
    fn accept(&mut self, entry: &mut EntryRecord) -> impl Future<Output = bool> {
        self(entry)
    }
}

impl<F, Fut> FailureObserver for F
where
    F: FnMut(&WalkFailure) -> Fut,
    Fut: Future<Output = ()>,
{
    fn on_fail(&mut self, failure: &WalkFailure) -> impl Future<Output = ()> {
        self(failure)
    }
}

/// Stores every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl EntryFilter for AcceptAll {
    async fn accept(&mut self, _entry: &mut EntryRecord) -> bool {
        true
    }
}

/// Ignores failures; they are still recorded by the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreFailures;

impl FailureObserver for IgnoreFailures {
    async fn on_fail(&mut self, _failure: &WalkFailure) {}
}

/// Cloneable handle that requests cooperative cancellation of a walk.
///
/// Callbacks capture a handle to stop the walk that is invoking them. The
/// request is honored at directory-descent boundaries only.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Create a fresh, unstopped handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the walk stop descending.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Check whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use dirmap_core::{EntryKind, FailureKind, ProbeError};
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_closure_filter_can_annotate() {
        let mut filter = |entry: &mut EntryRecord| {
            entry.extra.insert("seen".into(), true.into());
            let keep = entry.is_file();
            async move { keep }
        };

        let mut file = record("/r/f", EntryKind::RegularFile, 1);
        assert!(filter.accept(&mut file).await);
        assert_eq!(file.extra["seen"], serde_json::Value::Bool(true));

        let mut dir = record("/r", EntryKind::Directory, 0);
        assert!(!filter.accept(&mut dir).await);
    }

    #[tokio::test]
    async fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |failure: &WalkFailure| {
                seen.push(failure.absolute_path.clone());
                async {}
            };
            let failure = WalkFailure::new(
                "/r/x",
                FailureKind::Probe,
                ProbeError::NotFound {
                    path: PathBuf::from("/r/x"),
                },
            );
            observer.on_fail(&failure).await;
        }
        assert_eq!(seen, vec![PathBuf::from("/r/x")]);
    }

    #[test]
    fn test_stop_handle_shared_between_clones() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_stopped());
        clone.stop();
        assert!(handle.is_stopped());
    }
}
