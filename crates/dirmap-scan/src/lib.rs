//! Filesystem walking engine for dirmap.
//!
//! This crate walks a directory subtree, classifies every entry by type,
//! decodes its permission bits, optionally fingerprints regular files and
//! stores the results in type-partitioned collections.
//!
//! # Overview
//!
//! - **Pre-order traversal** over an explicit stack, one entry at a time
//! - **Inclusion filter** that controls storage, never descent
//! - **Failure observer** for probe, listing and hashing errors
//! - **Cooperative stop** honored at directory-descent boundaries
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use dirmap_scan::{AcceptAll, DirMap, IgnoreFailures, WalkOptions};
//!
//! # async fn example() {
//! let mut dirmap = DirMap::new();
//! dirmap
//!     .run("/path/to/walk", WalkOptions::with_fingerprints(), AcceptAll, IgnoreFailures)
//!     .await;
//!
//! println!("Total size: {} bytes", dirmap.total_size());
//! println!("Files: {}", dirmap.files().len());
//! # }
//! ```
//!
//! # Filtering and stopping
//!
//! ```rust,no_run
//! use dirmap_scan::{DirMap, EntryRecord, WalkFailure, WalkOptions};
//!
//! # async fn example() {
//! let mut dirmap = DirMap::new();
//! let stop = dirmap.stop_handle();
//!
//! dirmap
//!     .run(
//!         "/etc",
//!         WalkOptions::default(),
//!         |entry: &mut EntryRecord| {
//!             let keep = entry.name == "hosts";
//!             if keep {
//!                 stop.stop();
//!             }
//!             async move { keep }
//!         },
//!         |failure: &WalkFailure| {
//!             eprintln!("{}: {}", failure.absolute_path.display(), failure.error);
//!             async {}
//!         },
//!     )
//!     .await;
//! # }
//! ```

mod aggregate;
mod callback;
mod classify;
mod hash;
mod probe;
mod progress;
mod walker;

pub use aggregate::{Aggregator, EntryMap, FailureMap, WalkSummary};
pub use callback::{AcceptAll, EntryFilter, FailureObserver, IgnoreFailures, StopHandle};
pub use classify::{classify, decode_permissions};
pub use hash::{fingerprint_bytes, fingerprint_file};
pub use probe::{Probe, absolutize, list_dir, probe, snapshot};
pub use progress::{PROGRESS_INTERVAL, WalkProgress};
pub use walker::{DirMap, SessionState};

// Re-export core types for convenience
pub use dirmap_core::{
    EntryKind, EntryRecord, FailureKind, Fingerprint, Ownership, PermissionSet, Permissions,
    ProbeError, ProcessIdentity, RawMetadata, WalkConfig, WalkFailure, WalkOptions,
};
