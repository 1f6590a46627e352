use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Returns the hex-encoded BLAKE3 digest of `bytes`.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Streams the whole file at `file_path` through BLAKE3 and returns its hex digest.
///
/// Two files with the same bytes always produce the same fingerprint.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read. Callers treat
/// this as a per-file failure and leave the file out of the scan.
pub fn fingerprint_file(file_path: &Path) -> Result<String> {
    let mut file = fs::File::open(file_path)
        .with_context(|| format!("Failed to open file: '{}'", file_path.display()))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; READ_BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: '{}'", file_path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!("Hashed '{}' ({} bytes): {}", file_path.display(), total_bytes, hash);
    Ok(hash)
}
