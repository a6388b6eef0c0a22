//! File content fingerprints for change detection.
//!
//! A fingerprint is the SHA-256 of the file's bytes, as lowercase hex. Much
//! stronger than change detection strictly needs, but it is off the download
//! path and takes collisions out of the picture at any library size.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Streaming chunk size; keeps memory bounded for large media files.
const CHUNK_SIZE: usize = 64 * 1024;

/// Fingerprint a file's content.
///
/// Fails with the path in context if the file cannot be opened or read.
/// Callers must propagate this: a missing fingerprint means the snapshot is
/// incomplete, not that the file can be skipped.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    fingerprint_reader(file).with_context(|| format!("read {}", path.display()))
}

/// Fingerprint any byte stream. Split out so tests can hash in-memory data.
fn fingerprint_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
