//! Entry record types produced by a walk.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::identity::ProcessIdentity;

/// Type of a filesystem entry.
///
/// Exactly one tag applies to every probed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Directory,
    BlockDevice,
    CharDevice,
    Fifo,
    RegularFile,
    Socket,
    Symlink,
    /// Matches none of the other categories.
    Other,
}

impl EntryKind {
    /// All kinds, in collection order.
    pub const ALL: [EntryKind; 8] = [
        EntryKind::Directory,
        EntryKind::BlockDevice,
        EntryKind::CharDevice,
        EntryKind::Fifo,
        EntryKind::RegularFile,
        EntryKind::Socket,
        EntryKind::Symlink,
        EntryKind::Other,
    ];

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::RegularFile)
    }

    /// Short label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Directory => "directories",
            EntryKind::BlockDevice => "block devices",
            EntryKind::CharDevice => "character devices",
            EntryKind::Fifo => "fifos",
            EntryKind::RegularFile => "files",
            EntryKind::Socket => "sockets",
            EntryKind::Symlink => "symlinks",
            EntryKind::Other => "other",
        }
    }
}

/// Permission flags for one category of accessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    pub setuid: bool,
    pub setgid: bool,
    pub sticky: bool,
}

/// Decoded permission view of an entry.
///
/// Only `owner` and `process_user` carry the special bits; `group` and
/// `others` always report them as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub owner: PermissionSet,
    pub group: PermissionSet,
    pub others: PermissionSet,
    /// Access as seen by the walking process (group membership not consulted).
    pub process_user: PermissionSet,
    pub sticky: bool,
}

/// Owning uid/gid of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

/// Structured snapshot of the metadata returned by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetadata {
    /// Size in bytes.
    pub size: u64,
    /// Full mode word (file type and permission bits).
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// Device containing the entry.
    pub dev: u64,
    pub ino: u64,
    pub nlink: u64,
    /// Device ID for special files.
    pub rdev: u64,
    pub blksize: u64,
    /// Number of 512-byte blocks allocated.
    pub blocks: u64,
    pub accessed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Inode change time.
    pub changed: Option<DateTime<Utc>>,
    /// Birth time (platform-dependent).
    pub created: Option<DateTime<Utc>>,
}

/// MD5 content fingerprint for change and identity detection.
///
/// Not suitable as a security digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 16]);

impl Fingerprint {
    /// Create a fingerprint from raw digest bytes.
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the fingerprint as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// One successfully probed filesystem entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Final path component.
    pub name: CompactString,
    pub absolute_path: PathBuf,
    /// Path relative to the walk root (empty for the root itself).
    pub relative_path: PathBuf,
    /// Walk root.
    pub base_path: PathBuf,
    /// Directory containing this entry.
    pub parent_path: PathBuf,
    pub metadata: RawMetadata,
    pub kind: EntryKind,
    pub permissions: Permissions,
    pub owner: Ownership,
    pub process: ProcessIdentity,
    /// Present only for regular files when fingerprinting was requested.
    pub fingerprint: Option<Fingerprint>,
    /// Caller-attached data.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EntryRecord {
    /// Raw size in bytes.
    pub fn size(&self) -> u64 {
        self.metadata.size
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}
