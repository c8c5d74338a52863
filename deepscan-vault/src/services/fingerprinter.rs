//! Content fingerprinting
//!
//! SHA-256 over the raw bytes, rendered as 64 lowercase hex characters. Equal
//! digests are treated as equal content, so this must stay a cryptographic digest
//! and never a perceptual hash.

use axum::body::Bytes;
use deepscan_common::{Error, Result};
use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters
pub const DIGEST_HEX_LEN: usize = 64;

/// Fingerprint a byte buffer
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprint on the blocking pool so large uploads don't stall the runtime
pub async fn fingerprint_blocking(bytes: Bytes) -> Result<String> {
    tokio::task::spawn_blocking(move || fingerprint(&bytes))
        .await
        .map_err(|e| Error::Internal(format!("Hash calculation task failed: {}", e)))
}
