//! Entry classification and permission decoding.

use dirmap_core::{EntryKind, PermissionSet, Permissions, ProcessIdentity, RawMetadata};

pub(crate) const S_IFMT: u32 = 0o170_000;
pub(crate) const S_IFSOCK: u32 = 0o140_000;
pub(crate) const S_IFLNK: u32 = 0o120_000;
pub(crate) const S_IFREG: u32 = 0o100_000;
pub(crate) const S_IFBLK: u32 = 0o060_000;
pub(crate) const S_IFDIR: u32 = 0o040_000;
pub(crate) const S_IFCHR: u32 = 0o020_000;
pub(crate) const S_IFIFO: u32 = 0o010_000;

const S_ISUID: u32 = 0o4000;
const S_ISGID: u32 = 0o2000;
const S_ISVTX: u32 = 0o1000;

/// Map a mode word to its type tag.
pub fn classify(mode: u32) -> EntryKind {
    match mode & S_IFMT {
        S_IFDIR => EntryKind::Directory,
        S_IFBLK => EntryKind::BlockDevice,
        S_IFCHR => EntryKind::CharDevice,
        S_IFIFO => EntryKind::Fifo,
        S_IFREG => EntryKind::RegularFile,
        S_IFSOCK => EntryKind::Socket,
        S_IFLNK => EntryKind::Symlink,
        _ => EntryKind::Other,
    }
}

/// Decode the permission view of an entry relative to `process`.
///
/// Process-user access is granted when the process owns the entry or the
/// matching "others" bit is set. Group membership is not consulted.
pub fn decode_permissions(metadata: &RawMetadata, process: ProcessIdentity) -> Permissions {
    let mode = metadata.mode;
    let bit = |mask: u32| mode & mask != 0;
    let owns = metadata.uid == process.uid;

    let setuid = bit(S_ISUID);
    let setgid = bit(S_ISGID);
    let sticky = bit(S_ISVTX);

    Permissions {
        owner: PermissionSet {
            readable: bit(0o400),
            writable: bit(0o200),
            executable: bit(0o100),
            setuid,
            setgid,
            sticky,
        },
        group: PermissionSet {
            readable: bit(0o040),
            writable: bit(0o020),
            executable: bit(0o010),
            ..PermissionSet::default()
        },
        others: PermissionSet {
            readable: bit(0o004),
            writable: bit(0o002),
            executable: bit(0o001),
            ..PermissionSet::default()
        },
        process_user: PermissionSet {
            readable: owns || bit(0o004),
            writable: owns || bit(0o002),
            executable: owns || bit(0o001),
            setuid,
            setgid,
            sticky,
        },
        sticky,
    }
}
