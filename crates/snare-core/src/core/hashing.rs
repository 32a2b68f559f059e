// crates/snare-core/src/core/hashing.rs
// ============================================================================
// Module: Snare Content Hashing
// Description: SHA-256 content hashing and package checksum derivation.
// Purpose: Provide deterministic digests for artifacts and evidence packages.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Every artifact in an evidence package carries a SHA-256 digest, and the
//! package checksum is the SHA-256 of the concatenated per-object digests in
//! ascending object-name order. Digests are lowercase hex and identical on
//! every host for identical inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic SHA-256 content hash in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashDigest(String);

impl HashDigest {
    /// Wraps an existing lowercase hex digest string.
    #[must_use]
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HashDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    HashDigest(hex_encode(&hasher.finalize()))
}

/// Hashes raw bytes with SHA-256 and returns the lowercase hex string.
#[must_use]
pub fn hash_hex(bytes: &[u8]) -> String {
    hash_bytes(bytes).0
}

/// Computes a package checksum over per-object digests.
///
/// The caller supplies `(object_name, digest)` pairs; the pairs are sorted by
/// object name and the digest strings are concatenated before hashing, so the
/// result is independent of upload order.
#[must_use]
pub fn package_checksum(objects: &[(String, HashDigest)]) -> HashDigest {
    let mut sorted: Vec<&(String, HashDigest)> = objects.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut concatenated = String::with_capacity(sorted.len() * 64);
    for (_, digest) in sorted {
        concatenated.push_str(digest.as_str());
    }
    hash_bytes(concatenated.as_bytes())
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
