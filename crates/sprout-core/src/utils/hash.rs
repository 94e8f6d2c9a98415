//! SHA-1 checksums for package integrity.
//!
//! The release fleet publishes the lowercase hex SHA-1 of every package
//! archive; downloads are verified against it before anything touches disk.

use sha1::{Digest, Sha1};

use crate::error::{SproutError, SproutResult};

/// Compute the lowercase hex SHA-1 of data
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify data against a published checksum
///
/// The comparison is byte-for-byte: the published value is not trimmed or
/// case-folded.
pub fn verify_checksum(package: &str, data: &[u8], published: &[u8]) -> SproutResult<()> {
    let actual = sha1_hex(data);
    if actual.as_bytes() == published {
        Ok(())
    } else {
        Err(SproutError::IntegrityFailure {
            package: package.to_string(),
            expected: String::from_utf8_lossy(published).into_owned(),
            actual,
        })
    }
}
