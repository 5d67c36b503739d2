//! Identity of the process performing a walk.

use serde::{Deserialize, Serialize};

/// uid/gid pair used to decode process-relative permissions.
///
/// Captured once per walk session, never per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessIdentity {
    /// User ID.
    pub uid: u32,
    /// Group ID.
    pub gid: u32,
}

impl ProcessIdentity {
    /// Create an explicit identity.
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Identity of the current process.
    #[cfg(unix)]
    pub fn current() -> Self {
        // SAFETY: getuid/getgid cannot fail and touch no memory.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self { uid, gid }
    }

    #[cfg(not(unix))]
    pub fn current() -> Self {
        Self { uid: 0, gid: 0 }
    }
}
