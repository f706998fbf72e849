//! Content hashing for change detection
//!
//! A file "changed" iff its blake3 digest differs from the snapshot's.
//! Digests are computed over line-ending-normalized content (see
//! `source`), so checkouts on different platforms hash identically.

/// Compute the blake3 hex digest of a file's (normalized) content.
pub fn digest(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
