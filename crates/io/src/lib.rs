// Record export (xlsx, csv)

pub mod csv;
pub mod error;
pub mod table;
pub mod xlsx;

pub use error::ExportError;

use chrono::NaiveDateTime;

/// Default prefix for export file names.
pub const DEFAULT_FILENAME_PREFIX: &str = "VendHub_Export";

/// Timestamped export file name, e.g. `VendHub_Export_2024-03-15_09-30-00.xlsx`.
pub fn export_filename(prefix: &str, at: NaiveDateTime, extension: &str) -> String {
    format!("{}_{}.{}", prefix, at.format("%Y-%m-%d_%H-%M-%S"), extension)
}
