//! Streaming SHA-256 content hashing.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use stagehand_schema::Sha256Hash;
use std::io::Read;
use std::path::Path;

/// Read buffer size for streaming hashes: 64 KiB.
const HASH_BUF_SIZE: usize = 65536;

/// Compute the SHA-256 digest of a file's bytes.
///
/// Reads in fixed-size chunks so arbitrarily large packages never get
/// loaded into memory at once. The digest depends only on file content,
/// never on metadata. The file handle is dropped when this returns,
/// success or not.
///
/// # Errors
///
/// Returns an error if the path cannot be opened or read. Callers treat
/// this as fatal; there is no sentinel value for unreadable files.
pub fn hash_file(path: &Path) -> Result<Sha256Hash> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUF_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Sha256Hash::from_bytes(hasher.finalize().as_slice())
}
