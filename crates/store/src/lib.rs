//! `vendhub-store` - SQLite persistence for ingested records.
//!
//! Implements the `RecordSink` seam of `vendhub-core` with file-scoped dedup,
//! and serves filtered record pages and period statistics.

pub mod error;
pub mod model;
pub mod store;

pub use error::StoreError;
pub use model::{DatabaseStats, FileInfo, PeriodStats, RecordFilter, RecordPage, RecordQuery, StoredRecord};
pub use store::{FileWriter, RecordStore};
