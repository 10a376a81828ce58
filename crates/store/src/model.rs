use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

/// Largest page size a query may request.
pub const MAX_PAGE_SIZE: u32 = 500;
/// Page size used when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

// ---------------------------------------------------------------------------
// Stored entities
// ---------------------------------------------------------------------------

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub id: i64,
    pub filename: String,
    /// Data rows read from the file (duplicates included).
    pub row_count: usize,
    pub headers: Vec<String>,
    /// RFC 3339 timestamp
    pub uploaded_at: String,
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub file_id: i64,
    pub data: Map<String, Value>,
    pub date_field: Option<NaiveDate>,
    pub period: Option<String>,
    pub dedup_key: String,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Record filters shared by paginated queries and exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring of the row data.
    pub search: Option<String>,
    /// Exact `YYYY-MM` period.
    pub period: Option<String>,
    /// Inclusive lower bound on `date_field`.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `date_field`.
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub filter: RecordFilter,
    /// 1-based page number.
    pub page: u32,
    pub size: u32,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            filter: RecordFilter::default(),
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPage {
    pub total: usize,
    pub page: u32,
    pub size: u32,
    pub pages: usize,
    pub data: Vec<StoredRecord>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub period: String,
    pub count: usize,
    /// e.g. "March 2024"
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub total_files: usize,
    pub total_records: usize,
    /// Records with distinct data maps.
    pub unique_records: usize,
    /// Newest period first; undated records are not counted.
    pub periods: Vec<PeriodStats>,
}
