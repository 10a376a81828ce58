// Shared tabular layout for exports: a `#` column followed by the headers of
// the first record. Later records may come from files with other headers;
// their missing keys export as empty cells and extra keys are dropped.

use serde_json::Value;
use vendhub_store::StoredRecord;

/// Title of the running-index column.
pub const INDEX_HEADER: &str = "#";

pub fn export_headers(records: &[StoredRecord]) -> Vec<String> {
    records
        .first()
        .map(|r| r.data.keys().cloned().collect())
        .unwrap_or_default()
}

/// Cell text for one record, aligned to `headers`.
pub fn record_cells(record: &StoredRecord, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| match record.data.get(h) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
        .collect()
}
