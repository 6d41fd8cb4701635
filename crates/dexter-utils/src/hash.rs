use std::{
    fs::File,
    io::Read,
    path::Path,
};

use sha2::{Digest, Sha256};

use crate::error::{HashError, HashResult};

/// Calculates the SHA-256 checksum of a file.
///
/// Reads the contents of a file in fixed-size chunks and returns the digest as a lowercase
/// hex-encoded string (64 characters).
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be opened or read.
pub fn calculate_checksum<P: AsRef<Path>>(file_path: P) -> HashResult<String> {
    let file_path = file_path.as_ref();
    let mut file = File::open(file_path).map_err(|err| HashError::ReadFailed {
        path: file_path.to_path_buf(),
        source: err,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf).map_err(|err| HashError::ReadFailed {
            path: file_path.to_path_buf(),
            source: err,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex_encode(&hasher.finalize()))
}

/// Calculates the SHA-256 checksum of an in-memory byte slice.
pub fn calculate_checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(&hasher.finalize())
}

/// Verifies the checksum of a file against an expected value.
///
/// Compares case-insensitively against the `expected` checksum string.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be read.
pub fn verify_checksum<P: AsRef<Path>>(file_path: P, expected: &str) -> HashResult<bool> {
    let actual = calculate_checksum(file_path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
