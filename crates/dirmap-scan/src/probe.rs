//! Metadata retrieval for a single path.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use chrono::{DateTime, Utc};

use dirmap_core::{ProbeError, RawMetadata};

/// Result of a successful probe.
#[derive(Debug, Clone)]
pub struct Probe {
    /// Absolute form of the probed path.
    pub absolute_path: PathBuf,
    /// Metadata snapshot (links followed).
    pub metadata: RawMetadata,
}

/// Resolve a path to absolute form without touching symlinks.
///
/// `.` and `..` components are collapsed lexically, so `/a/b/..` becomes `/a`.
pub fn absolutize(path: &Path) -> Result<PathBuf, ProbeError> {
    let absolute = std::path::absolute(path).map_err(|e| ProbeError::io(path, e))?;
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Obtain link-following metadata for `path`.
///
/// A dangling symlink surfaces as [`ProbeError::NotFound`].
pub async fn probe(path: &Path) -> Result<Probe, ProbeError> {
    let absolute_path = absolutize(path)?;
    let metadata = tokio::fs::metadata(&absolute_path)
        .await
        .map_err(|e| ProbeError::io(&absolute_path, e))?;

    Ok(Probe {
        metadata: snapshot(&metadata),
        absolute_path,
    })
}

/// List a directory's children in the order the OS returns them.
pub async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ProbeError::io(dir, e))?;

    let mut children = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| ProbeError::io(dir, e))?
    {
        children.push(entry.path());
    }
    Ok(children)
}

/// Convert std metadata into a structured snapshot.
pub fn snapshot(metadata: &Metadata) -> RawMetadata {
    RawMetadata {
        size: metadata.len(),
        mode: get_mode(metadata),
        uid: get_uid(metadata),
        gid: get_gid(metadata),
        dev: get_dev(metadata),
        ino: get_ino(metadata),
        nlink: get_nlink(metadata),
        rdev: get_rdev(metadata),
        blksize: get_blksize(metadata),
        blocks: get_blocks(metadata),
        accessed: metadata.accessed().ok().map(DateTime::<Utc>::from),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        changed: get_changed(metadata),
        created: metadata.created().ok().map(DateTime::<Utc>::from),
    }
}

// Cross-platform metadata helpers

#[cfg(unix)]
fn get_mode(metadata: &Metadata) -> u32 {
    metadata.mode()
}

/// Synthesize a unix-style mode word from the portable file type.
#[cfg(not(unix))]
fn get_mode(metadata: &Metadata) -> u32 {
    use crate::classify::{S_IFDIR, S_IFLNK, S_IFREG};

    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        S_IFDIR
    } else if file_type.is_symlink() {
        S_IFLNK
    } else if file_type.is_file() {
        S_IFREG
    } else {
        0
    };
    let perms = if metadata.permissions().readonly() { 0o444 } else { 0o644 };
    kind | perms
}

#[cfg(unix)]
fn get_uid(metadata: &Metadata) -> u32 {
    metadata.uid()
}

#[cfg(not(unix))]
fn get_uid(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn get_gid(metadata: &Metadata) -> u32 {
    metadata.gid()
}

#[cfg(not(unix))]
fn get_gid(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn get_dev(metadata: &Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn get_ino(metadata: &Metadata) -> u64 {
    metadata.ino()
}

#[cfg(not(unix))]
fn get_ino(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn get_nlink(metadata: &Metadata) -> u64 {
    metadata.nlink()
}

#[cfg(not(unix))]
fn get_nlink(_metadata: &Metadata) -> u64 {
    1
}

#[cfg(unix)]
fn get_rdev(metadata: &Metadata) -> u64 {
    metadata.rdev()
}

#[cfg(not(unix))]
fn get_rdev(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn get_blksize(metadata: &Metadata) -> u64 {
    metadata.blksize()
}

#[cfg(not(unix))]
fn get_blksize(_metadata: &Metadata) -> u64 {
    4096
}

#[cfg(unix)]
fn get_blocks(metadata: &Metadata) -> u64 {
    metadata.blocks()
}

#[cfg(not(unix))]
fn get_blocks(metadata: &Metadata) -> u64 {
    metadata.len().div_ceil(512)
}

#[cfg(unix)]
fn get_changed(metadata: &Metadata) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
}

#[cfg(not(unix))]
fn get_changed(_metadata: &Metadata) -> Option<DateTime<Utc>> {
    None
}
