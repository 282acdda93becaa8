//! SHA-256 content fingerprints.
//!
//! Files are streamed in fixed-size chunks, never loaded whole. The digest
//! depends only on the bytes, not on the chunk size used to read them.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::config::DEFAULT_HASH_CHUNK_SIZE;

/// Fingerprint everything readable from `reader`
pub fn fingerprint_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint a file on disk
pub fn fingerprint_file(path: &Path, chunk_size: usize) -> io::Result<String> {
    let file = File::open(path)?;
    fingerprint_reader(file, chunk_size)
}

/// Check a file still matches an expected fingerprint.
/// A missing file is a mismatch, not an error.
pub fn verify_fingerprint(path: &Path, expected: &str) -> io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let current = fingerprint_file(path, DEFAULT_HASH_CHUNK_SIZE)?;
    Ok(current == expected)
}
