//! Content digests for change detection.
//!
//! digest = hex(blake3(json(record)))

use crate::error::CaptureError;
use serde::Serialize;

/// Length of a digest string in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Compute the content digest of a serializable record.
///
/// Struct fields serialize in declaration order and `serde_json` maps are
/// key-sorted, so equal records always produce equal digests.
pub fn content_digest<T: Serialize + ?Sized>(record: &T) -> Result<String, CaptureError> {
    let bytes = serde_json::to_vec(record).map_err(|e| CaptureError::Digest(e.to_string()))?;
    Ok(bytes_digest(&bytes))
}

/// Digest of raw bytes, used for downloaded file contents.
pub fn bytes_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
