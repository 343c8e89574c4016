//! Stable issue fingerprints
//!
//! A fingerprint is the deduplication key for one distinct problem. It is
//! derived from issue content, never from time or scan ordering, so the
//! same recurring issue collapses to one suppression entry across scans
//! and process restarts, while a genuinely new issue gets a fresh key.

use sha2::{Digest, Sha256};

/// Fingerprint for a workload blocked from starting.
///
/// The exact `name:reason:message` concatenation; changes only when the
/// reported reason or message text changes.
pub fn blocked_fingerprint(name: &str, reason: &str, message: &str) -> String {
    format!("{name}:{reason}:{message}")
}

/// Fingerprint for a log-derived issue: a SHA-256 digest of the excerpt
/// text, hex-encoded. Identical error content always maps to the same
/// fingerprint; surrounding unrelated log lines never influence it.
pub fn log_fingerprint(excerpt: &str) -> String {
    hex::encode(Sha256::digest(excerpt.as_bytes()))
}
