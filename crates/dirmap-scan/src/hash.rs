//! Streaming MD5 fingerprints for regular files.

use std::path::Path;

use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

use dirmap_core::{Fingerprint, ProbeError};

/// Stream a file's content through MD5.
///
/// Reads `buffer_size` bytes at a time; only one file descriptor is open.
pub async fn fingerprint_file(path: &Path, buffer_size: usize) -> Result<Fingerprint, ProbeError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ProbeError::io(path, e))?;

    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(|e| ProbeError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Fingerprint::new(hasher.finalize().into()))
}

/// Fingerprint an in-memory buffer.
pub fn fingerprint_bytes(content: &[u8]) -> Fingerprint {
    Fingerprint::new(Md5::digest(content).into())
}
