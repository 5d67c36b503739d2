//! Walk configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::identity::ProcessIdentity;

/// Default read buffer size used when streaming file content.
pub const DEFAULT_HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Per-run options accepted by a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkOptions {
    /// Compute an MD5 fingerprint for every regular file.
    #[serde(default)]
    pub compute_fingerprints: bool,
}

impl WalkOptions {
    /// Options with fingerprinting enabled.
    pub fn with_fingerprints() -> Self {
        Self {
            compute_fingerprints: true,
        }
    }
}

/// Configuration for a walk session.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Root path to walk.
    pub root: PathBuf,

    /// Compute content fingerprints for regular files.
    #[builder(default = "false")]
    #[serde(default)]
    pub compute_fingerprints: bool,

    /// Read buffer size for content hashing.
    #[builder(default = "DEFAULT_HASH_BUFFER_SIZE")]
    #[serde(default = "default_hash_buffer_size")]
    pub hash_buffer_size: usize,

    /// Identity used for process-relative permissions (None = current process).
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub identity: Option<ProcessIdentity>,
}

fn default_hash_buffer_size() -> usize {
    DEFAULT_HASH_BUFFER_SIZE
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.hash_buffer_size == Some(0) {
            return Err("Hash buffer size must be non-zero".to_string());
        }
        Ok(())
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create a simple config for walking a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compute_fingerprints: false,
            hash_buffer_size: DEFAULT_HASH_BUFFER_SIZE,
            identity: None,
        }
    }

    /// Per-run options derived from this config.
    pub fn options(&self) -> WalkOptions {
        WalkOptions {
            compute_fingerprints: self.compute_fingerprints,
        }
    }

    /// Identity to use, falling back to the current process.
    pub fn resolve_identity(&self) -> ProcessIdentity {
        self.identity.unwrap_or_else(ProcessIdentity::current)
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
