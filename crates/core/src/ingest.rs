// Ingestion: grid -> prepared records -> record sink
//
// The orchestrator is stateless. It derives everything a store needs per row
// and leaves the duplicate decision and persistence to the sink.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::date::extract_date;
use crate::dedup::dedup_key;
use crate::error::IngestError;
use crate::grid::Grid;
use crate::period::derive_period;

/// Upload extensions accepted by [`check_extension`].
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// A row ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRecord {
    /// Header name -> cell value, in header order.
    pub data: Map<String, Value>,
    pub date_field: Option<NaiveDate>,
    /// `YYYY-MM`, present exactly when `date_field` is.
    pub period: Option<String>,
    pub dedup_key: String,
}

/// What a sink did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Inserted,
    Duplicate,
}

/// Destination for prepared records (usually a store transaction).
pub trait RecordSink {
    type Error: std::fmt::Display;

    fn accept(&mut self, record: &PreparedRecord) -> Result<SinkOutcome, Self::Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub rows_read: usize,
    pub records_added: usize,
    pub duplicates_skipped: usize,
    pub dated_records: usize,
}

/// Zip headers with a row (up to the shorter length) into a record map.
/// A repeated header keeps its first position and takes the later value.
pub fn record_data(headers: &[String], row: &[String]) -> Map<String, Value> {
    headers
        .iter()
        .zip(row.iter())
        .map(|(h, v)| (h.clone(), Value::String(v.clone())))
        .collect()
}

pub fn prepare_record(headers: &[String], row: &[String]) -> PreparedRecord {
    let date_field = extract_date(row);
    PreparedRecord {
        data: record_data(headers, row),
        date_field,
        period: date_field.map(derive_period),
        dedup_key: dedup_key(row),
    }
}

/// Feed every row of `grid` to `sink` in source order.
pub fn ingest<S: RecordSink>(grid: &Grid, sink: &mut S) -> Result<IngestSummary, IngestError> {
    if grid.is_empty() {
        return Err(IngestError::NoDataRows);
    }

    let mut summary = IngestSummary::default();
    for (index, row) in grid.rows.iter().enumerate() {
        summary.rows_read += 1;
        let record = prepare_record(&grid.headers, row);
        if record.date_field.is_some() {
            summary.dated_records += 1;
        }
        match sink.accept(&record).map_err(|e| IngestError::Sink(e.to_string()))? {
            SinkOutcome::Inserted => summary.records_added += 1,
            SinkOutcome::Duplicate => {
                log::debug!("row {} is a duplicate (key {})", index + 1, record.dedup_key);
                summary.duplicates_skipped += 1;
            }
        }
    }

    log::info!(
        "ingested {} rows: {} added, {} duplicates",
        summary.rows_read,
        summary.records_added,
        summary.duplicates_skipped
    );
    Ok(summary)
}

/// Reject uploads whose name does not end in an accepted extension.
pub fn check_extension(filename: &str) -> Result<(), IngestError> {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(IngestError::UnsupportedFileType(filename.to_string())),
    }
}

/// In-memory sink that suppresses exact repeats of a record's data within
/// one pass. Mostly useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<PreparedRecord>,
}

impl RecordSink for MemorySink {
    type Error = std::convert::Infallible;

    fn accept(&mut self, record: &PreparedRecord) -> Result<SinkOutcome, Self::Error> {
        if self.records.iter().any(|r| r.data == record.data) {
            return Ok(SinkOutcome::Duplicate);
        }
        self.records.push(record.clone());
        Ok(SinkOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prepares_date_and_period_together() {
        let headers = strings(&["Name", "Date"]);
        let rec = prepare_record(&headers, &strings(&["Alice", "01.03.2024"]));
        assert_eq!(rec.date_field, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(rec.period.as_deref(), Some("2024-03"));
        assert_eq!(rec.data["Name"], "Alice");

        let rec = prepare_record(&headers, &strings(&["Bob", ""]));
        assert_eq!(rec.date_field, None);
        assert_eq!(rec.period, None);
    }

    #[test]
    fn record_data_truncates_to_shorter() {
        let headers = strings(&["A", "B", "C"]);
        let data = record_data(&headers, &strings(&["1", "2"]));
        assert_eq!(data.len(), 2);
        assert!(!data.contains_key("C"));

        let headers = strings(&["A"]);
        let data = record_data(&headers, &strings(&["1", "2", "3"]));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn repeated_header_keeps_last_value() {
        let headers = strings(&["X", "Y", "X"]);
        let data = record_data(&headers, &strings(&["1", "2", "3"]));
        let keys: Vec<_> = data.keys().cloned().collect();
        assert_eq!(keys, vec!["X", "Y"]);
        assert_eq!(data["X"], "3");
    }

    #[test]
    fn ingest_counts_duplicates() {
        let grid = Grid {
            headers: strings(&["Name", "Date"]),
            rows: vec![
                strings(&["Alice", "01.03.2024"]),
                strings(&["Bob", ""]),
                strings(&["Alice", "01.03.2024"]),
            ],
        };
        let mut sink = MemorySink::default();
        let summary = ingest(&grid, &mut sink).unwrap();
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.records_added, 2);
        assert_eq!(summary.duplicates_skipped, 1);
        assert_eq!(summary.dated_records, 2);
        assert_eq!(sink.records.len(), 2);
    }

    #[test]
    fn ingest_rejects_empty_grid() {
        let grid = Grid { headers: strings(&["A"]), rows: vec![] };
        let mut sink = MemorySink::default();
        assert_eq!(ingest(&grid, &mut sink), Err(IngestError::NoDataRows));
    }

    #[test]
    fn extension_gate() {
        assert!(check_extension("report.xlsx").is_ok());
        assert!(check_extension("OLD.XLS").is_ok());
        assert!(matches!(check_extension("data.csv"), Err(IngestError::UnsupportedFileType(_))));
        assert!(check_extension("noext").is_err());
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        type Error = String;

        fn accept(&mut self, _record: &PreparedRecord) -> Result<SinkOutcome, Self::Error> {
            Err("disk full".to_string())
        }
    }

    #[test]
    fn sink_errors_propagate() {
        let grid = Grid { headers: strings(&["A"]), rows: vec![strings(&["1"])] };
        let err = ingest(&grid, &mut FailingSink).unwrap_err();
        assert_eq!(err, IngestError::Sink("disk full".to_string()));
    }
}
