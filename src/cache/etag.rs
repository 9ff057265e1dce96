use sha2::{Digest, Sha256};

use super::ResourceRecord;

/// Derives the strong ETag for a record.
///
/// SHA-256 over the compact JSON of `data` followed by the decimal `version`,
/// hex encoded and wrapped in double quotes. `serde_json` keeps object keys
/// sorted, so equal data always serializes to the same bytes.
pub fn compute_etag(record: &ResourceRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.data.to_string().as_bytes());
    hasher.update(record.version.to_string().as_bytes());
    format!("\"{}\"", hex::encode(hasher.finalize()))
}
