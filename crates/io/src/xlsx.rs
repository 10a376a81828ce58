// XLSX export of stored records
//
// Presentation snapshot for sharing: one sheet, a styled header row, every
// value written as text exactly as it was ingested. Not a round-trip format.

use std::path::Path;
use std::time::Instant;

use rust_xlsxwriter::{Color, Format, Workbook as XlsxWorkbook, Worksheet};
use vendhub_store::StoredRecord;

use crate::error::ExportError;
use crate::table::{export_headers, record_cells, INDEX_HEADER};

/// Default header fill (#667EEA).
pub const DEFAULT_HEADER_FILL: u32 = 0x667EEA;

/// Default worksheet title.
pub const DEFAULT_SHEET_TITLE: &str = "VendHub Database";

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub sheet_title: String,
    /// Header background as 0xRRGGBB.
    pub header_fill: u32,
    /// Keep the header row visible while scrolling.
    pub freeze_header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_title: DEFAULT_SHEET_TITLE.to_string(),
            header_fill: DEFAULT_HEADER_FILL,
            freeze_header: true,
        }
    }
}

/// Result of an export operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Data rows written (header excluded)
    pub rows_exported: usize,
    /// Columns written, including the `#` column
    pub columns_exported: usize,
    /// Export duration in milliseconds
    pub export_duration_ms: u128,
}

impl ExportResult {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        format!(
            "{} row{}, {} columns",
            self.rows_exported,
            if self.rows_exported == 1 { "" } else { "s" },
            self.columns_exported
        )
    }
}

/// Build the workbook in memory and return its bytes.
pub fn export_records(
    records: &[StoredRecord],
    options: &ExportOptions,
) -> Result<(Vec<u8>, ExportResult), ExportError> {
    let start_time = Instant::now();
    let mut workbook = build_workbook(records, options)?;
    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| ExportError::Xlsx(format!("Failed to build XLSX: {}", e)))?;

    let result = ExportResult {
        rows_exported: records.len(),
        columns_exported: export_headers(records).len() + 1,
        export_duration_ms: start_time.elapsed().as_millis(),
    };
    log::info!("exported {} to xlsx ({} bytes)", result.summary(), bytes.len());
    Ok((bytes, result))
}

/// Export straight to a file.
pub fn export_records_to_path(
    records: &[StoredRecord],
    path: &Path,
    options: &ExportOptions,
) -> Result<ExportResult, ExportError> {
    let start_time = Instant::now();
    let mut workbook = build_workbook(records, options)?;
    workbook
        .save(path)
        .map_err(|e| ExportError::Xlsx(format!("Failed to save XLSX file: {}", e)))?;

    let result = ExportResult {
        rows_exported: records.len(),
        columns_exported: export_headers(records).len() + 1,
        export_duration_ms: start_time.elapsed().as_millis(),
    };
    log::info!("exported {} to {}", result.summary(), path.display());
    Ok(result)
}

fn build_workbook(records: &[StoredRecord], options: &ExportOptions) -> Result<XlsxWorkbook, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name(&options.sheet_title))
        .map_err(|e| ExportError::Xlsx(format!("Failed to create sheet '{}': {}", options.sheet_title, e)))?;

    let headers = export_headers(records);
    write_header_row(worksheet, &headers, options)?;

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet
            .write_number(row, 0, (i + 1) as f64)
            .map_err(|e| ExportError::Xlsx(format!("Failed to write row {}: {}", row, e)))?;
        for (col, value) in record_cells(record, &headers).iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row, (col + 1) as u16, value)
                .map_err(|e| ExportError::Xlsx(format!("Failed to write row {}: {}", row, e)))?;
        }
    }

    if options.freeze_header {
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| ExportError::Xlsx(format!("Failed to freeze header: {}", e)))?;
    }
    worksheet.autofit();

    Ok(workbook)
}

fn write_header_row(
    worksheet: &mut Worksheet,
    headers: &[String],
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(options.header_fill));

    let all = std::iter::once(INDEX_HEADER).chain(headers.iter().map(|h| h.as_str()));
    for (col, title) in all.enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, title, &header_format)
            .map_err(|e| ExportError::Xlsx(format!("Failed to write header: {}", e)))?;
    }
    Ok(())
}

/// Worksheet names may not contain `[]:*?/\` and are capped at 31 chars.
fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        DEFAULT_SHEET_TITLE.to_string()
    } else {
        cleaned
    }
}
