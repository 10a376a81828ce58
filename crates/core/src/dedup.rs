// Content-addressed dedup keys for rows

use sha2::{Digest, Sha256};

/// Canonical text of a row for hashing: each cell trimmed and lower-cased,
/// written as a JSON array with `", "` between items and non-ASCII kept
/// verbatim. The separator is part of the key format; changing it changes
/// every key already stored.
pub fn canonical_row<S: AsRef<str>>(row: &[S]) -> String {
    let mut out = String::from("[");
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let normalized = cell.as_ref().trim().to_lowercase();
        // Serializing a &str cannot fail
        out.push_str(&serde_json::to_string(&normalized).unwrap_or_default());
    }
    out.push(']');
    out
}

/// SHA-256 of the canonical row, as 64 lower-case hex chars.
pub fn dedup_key<S: AsRef<str>>(row: &[S]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_row(row).as_bytes());
    format!("{:x}", hasher.finalize())
}
