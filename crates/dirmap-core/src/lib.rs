//! Core types for dirmap.
//!
//! This crate provides the data model shared by the walking engine and its
//! callers: entry records, type tags, permission views, failures and
//! configuration.

mod config;
mod entry;
mod error;
mod identity;

pub use config::{DEFAULT_HASH_BUFFER_SIZE, WalkConfig, WalkConfigBuilder, WalkOptions};
pub use entry::{
    EntryKind, EntryRecord, Fingerprint, Ownership, PermissionSet, Permissions, RawMetadata,
};
pub use error::{FailureKind, ProbeError, WalkFailure};
pub use identity::ProcessIdentity;
