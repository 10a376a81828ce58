// Record store backed by SQLite
//
// One transaction per uploaded file: `begin_file` opens it, the returned
// `FileWriter` receives records as a `RecordSink`, and `commit` makes the
// upload visible. Dropping a writer without committing rolls the upload back.

use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use serde_json::{Map, Value};

use vendhub_core::ingest::{PreparedRecord, RecordSink, SinkOutcome};
use vendhub_core::period_label;

use crate::error::StoreError;
use crate::model::{
    DatabaseStats, FileInfo, PeriodStats, RecordFilter, RecordPage, RecordQuery, StoredRecord,
    MAX_PAGE_SIZE,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    row_count INTEGER NOT NULL DEFAULT 0,
    headers TEXT NOT NULL,           -- JSON array
    uploaded_at TEXT NOT NULL        -- RFC 3339
);

CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    data TEXT NOT NULL,              -- JSON object in header order
    dedup_key TEXT NOT NULL,
    date_field TEXT,                 -- YYYY-MM-DD, NULL when no date was found
    period TEXT,                     -- YYYY-MM, NULL iff date_field is NULL
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_uploaded ON files (uploaded_at);
CREATE INDEX IF NOT EXISTS idx_records_file_date ON records (file_id, date_field);
CREATE INDEX IF NOT EXISTS idx_records_date_period ON records (date_field, period);
CREATE INDEX IF NOT EXISTS idx_records_dedup ON records (dedup_key);
"#;

const DATE_FORMAT: &str = "%Y-%m-%d";

const RECORD_COLUMNS: &str = "id, file_id, data, dedup_key, date_field, period, created_at";

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        log::debug!("opened record store at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Register an uploaded file and open its transaction.
    pub fn begin_file(
        &mut self,
        filename: &str,
        headers: &[String],
        row_count: usize,
    ) -> Result<FileWriter<'_>, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO files (filename, row_count, headers, uploaded_at) VALUES (?1, ?2, ?3, ?4)",
            params![filename, row_count as i64, serde_json::to_string(headers)?, now()],
        )?;
        let file_id = tx.last_insert_rowid();
        Ok(FileWriter { tx, file_id, added: 0 })
    }

    /// All files, newest upload first.
    pub fn list_files(&self) -> Result<Vec<FileInfo>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, row_count, headers, uploaded_at FROM files
             ORDER BY uploaded_at DESC, id DESC",
        )?;
        let raw = stmt
            .query_map([], RawFile::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawFile::into_info).collect()
    }

    pub fn get_file(&self, id: i64) -> Result<FileInfo, StoreError> {
        read_file(&self.conn, id)?.ok_or(StoreError::NotFound { kind: "file", id })
    }

    /// Delete a file and every record ingested from it.
    pub fn delete_file(&mut self, id: i64) -> Result<FileInfo, StoreError> {
        let info = self.get_file(id)?;
        self.conn.execute("DELETE FROM files WHERE id = ?1", params![id])?;
        log::info!("deleted file {} ({})", id, info.filename);
        Ok(info)
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// One page of records matching the filter, newest date first and
    /// undated records last.
    pub fn query(&self, query: &RecordQuery) -> Result<RecordPage, StoreError> {
        if query.page < 1 {
            return Err(StoreError::InvalidQuery("page must be at least 1".into()));
        }
        if query.size < 1 || query.size > MAX_PAGE_SIZE {
            return Err(StoreError::InvalidQuery(format!(
                "size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                query.size
            )));
        }

        let (where_sql, mut values) = where_clause(&query.filter);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM records{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let offset = (query.page as i64 - 1) * query.size as i64;
        values.push(SqlValue::Integer(query.size as i64));
        let limit_idx = values.len();
        values.push(SqlValue::Integer(offset));
        let offset_idx = values.len();

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records{where_sql} {ORDER_BY} LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );
        let data = self.select_records(&sql, &values)?;

        let total = total as usize;
        let size = query.size as usize;
        Ok(RecordPage {
            total,
            page: query.page,
            size: query.size,
            pages: total.div_ceil(size),
            data,
        })
    }

    /// Every record matching the filter, in query order.
    pub fn query_all(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        let (where_sql, values) = where_clause(filter);
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records{where_sql} {ORDER_BY}");
        self.select_records(&sql, &values)
    }

    /// Records of one file in ingestion order.
    pub fn file_records(&self, file_id: i64) -> Result<Vec<StoredRecord>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE file_id = ?1 ORDER BY id");
        self.select_records(&sql, &[SqlValue::Integer(file_id)])
    }

    fn select_records(&self, sql: &str, values: &[SqlValue]) -> Result<Vec<StoredRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map(params_from_iter(values.iter()), RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRecord::into_record).collect()
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> Result<DatabaseStats, StoreError> {
        let count = |sql: &str| -> Result<usize, StoreError> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let total_files = count("SELECT COUNT(*) FROM files")?;
        let total_records = count("SELECT COUNT(*) FROM records")?;
        let unique_records = count("SELECT COUNT(DISTINCT data) FROM records")?;

        let mut stmt = self.conn.prepare(
            "SELECT period, COUNT(*) FROM records WHERE period IS NOT NULL
             GROUP BY period ORDER BY period DESC",
        )?;
        let periods = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .map(|r| {
                r.map(|(period, n)| PeriodStats {
                    label: period_label(&period).unwrap_or_else(|| period.clone()),
                    period,
                    count: n as usize,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DatabaseStats {
            total_files,
            total_records,
            unique_records,
            periods,
        })
    }
}

// ---------------------------------------------------------------------------
// Per-file writer
// ---------------------------------------------------------------------------

/// Open upload transaction. Dedup is scoped to this file: a record whose data
/// map equals one already stored for the same file is skipped.
pub struct FileWriter<'a> {
    tx: Transaction<'a>,
    file_id: i64,
    added: usize,
}

impl FileWriter<'_> {
    pub fn file_id(&self) -> i64 {
        self.file_id
    }

    pub fn commit(self) -> Result<FileInfo, StoreError> {
        let info = read_file(&self.tx, self.file_id)?
            .ok_or(StoreError::NotFound { kind: "file", id: self.file_id })?;
        self.tx.commit()?;
        log::info!(
            "stored file {} ({}): {} records added",
            info.id,
            info.filename,
            self.added
        );
        Ok(info)
    }
}

impl RecordSink for FileWriter<'_> {
    type Error = StoreError;

    fn accept(&mut self, record: &PreparedRecord) -> Result<SinkOutcome, StoreError> {
        let data = serde_json::to_string(&record.data)?;

        let exists: bool = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM records WHERE file_id = ?1 AND data = ?2)",
            params![self.file_id, data],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(SinkOutcome::Duplicate);
        }

        self.tx.execute(
            "INSERT INTO records (file_id, data, dedup_key, date_field, period, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.file_id,
                data,
                record.dedup_key,
                record.date_field.map(|d| d.format(DATE_FORMAT).to_string()),
                record.period,
                now(),
            ],
        )?;
        self.added += 1;
        Ok(SinkOutcome::Inserted)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ORDER_BY: &str = "ORDER BY date_field IS NULL, date_field DESC, id ASC";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escape LIKE wildcards so search text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// SQL `WHERE` clause (with leading space, or empty) and its positional values.
fn where_clause(filter: &RecordFilter) -> (String, Vec<SqlValue>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        values.push(SqlValue::Text(format!("%{}%", escape_like(search))));
        clauses.push(format!("data LIKE ?{} ESCAPE '\\'", values.len()));
    }
    if let Some(period) = &filter.period {
        values.push(SqlValue::Text(period.clone()));
        clauses.push(format!("period = ?{}", values.len()));
    }
    if let Some(from) = filter.date_from {
        values.push(SqlValue::Text(from.format(DATE_FORMAT).to_string()));
        clauses.push(format!("date_field >= ?{}", values.len()));
    }
    if let Some(to) = filter.date_to {
        values.push(SqlValue::Text(to.format(DATE_FORMAT).to_string()));
        clauses.push(format!("date_field <= ?{}", values.len()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn read_file(conn: &Connection, id: i64) -> Result<Option<FileInfo>, StoreError> {
    conn.query_row(
        "SELECT id, filename, row_count, headers, uploaded_at FROM files WHERE id = ?1",
        params![id],
        RawFile::from_row,
    )
    .optional()?
    .map(RawFile::into_info)
    .transpose()
}

/// Column values as read, before JSON/date decoding.
struct RawFile {
    id: i64,
    filename: String,
    row_count: i64,
    headers: String,
    uploaded_at: String,
}

impl RawFile {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            filename: row.get(1)?,
            row_count: row.get(2)?,
            headers: row.get(3)?,
            uploaded_at: row.get(4)?,
        })
    }

    fn into_info(self) -> Result<FileInfo, StoreError> {
        Ok(FileInfo {
            id: self.id,
            filename: self.filename,
            row_count: self.row_count as usize,
            headers: serde_json::from_str(&self.headers)?,
            uploaded_at: self.uploaded_at,
        })
    }
}

struct RawRecord {
    id: i64,
    file_id: i64,
    data: String,
    dedup_key: String,
    date_field: Option<String>,
    period: Option<String>,
    created_at: String,
}

impl RawRecord {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            file_id: row.get(1)?,
            data: row.get(2)?,
            dedup_key: row.get(3)?,
            date_field: row.get(4)?,
            period: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<StoredRecord, StoreError> {
        let data: Map<String, Value> = serde_json::from_str(&self.data)?;
        let date_field = self
            .date_field
            .map(|s| {
                NaiveDate::parse_from_str(&s, DATE_FORMAT)
                    .map_err(|e| StoreError::Json(format!("record {}: bad date '{s}': {e}", self.id)))
            })
            .transpose()?;
        Ok(StoredRecord {
            id: self.id,
            file_id: self.file_id,
            data,
            date_field,
            period: self.period,
            dedup_key: self.dedup_key,
            created_at: self.created_at,
        })
    }
}
