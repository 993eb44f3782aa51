//! Canonical serialization for deterministic hashing.
//!
//! Assay outputs, configuration objects and batch manifests are hashed so
//! that two runs over the same corpus can be compared byte-for-byte.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap for maps in hashed data
//! - Floats are quantized by callers before hashing when cross-platform
//!   stability matters (see [`crate::policy::AssayConfig::config_hash`])

use serde::Serialize;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Only plain data (structs, vectors, ordered maps with string keys) is hashed
/// in this crate, for which JSON serialization cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// SHA-256 digest of raw page source, hex encoded.
///
/// Used as the content half of a page's provenance: the page identifier names
/// the capture, the digest pins the exact bytes that were classified.
pub fn content_digest(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
