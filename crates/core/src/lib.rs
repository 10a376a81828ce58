//! `vendhub-core` - spreadsheet ingestion pipeline.
//!
//! Pure crate: turns uploaded workbook bytes into headers and rows, derives a
//! date, period and dedup key per row, and tallies column types. Persistence
//! is left to a [`RecordSink`].

pub mod date;
pub mod dedup;
pub mod error;
pub mod grid;
pub mod ingest;
pub mod period;
pub mod validate;

pub use date::{extract_date, extract_date_from_cell};
pub use dedup::dedup_key;
pub use error::IngestError;
pub use grid::{parse, parse_path, Grid};
pub use ingest::{check_extension, ingest, prepare_record, IngestSummary, PreparedRecord, RecordSink, SinkOutcome};
pub use period::{derive_period, period_label};
pub use validate::{validate_structure, ColumnTypes, StructureReport};
