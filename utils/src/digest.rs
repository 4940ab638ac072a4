//! Evidence digests.
//!
//! Verification evidence (face captures, session logs) stays off-ledger; the
//! ledger records a SHA-256 digest of it as the `image_hash` reference.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `evidence`.
pub fn evidence_digest(evidence: &[u8]) -> String {
    hex::encode(Sha256::digest(evidence))
}
