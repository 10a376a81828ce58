// CSV export of stored records (same layout as XLSX, no styling)

use std::io::Write;
use std::path::Path;

use vendhub_store::StoredRecord;

use crate::error::ExportError;
use crate::table::{export_headers, record_cells, INDEX_HEADER};

pub fn export_records<W: Write>(records: &[StoredRecord], out: W) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut writer = csv::WriterBuilder::new().flexible(false).from_writer(out);
    let headers = export_headers(records);

    let mut header_row = Vec::with_capacity(headers.len() + 1);
    header_row.push(INDEX_HEADER.to_string());
    header_row.extend(headers.iter().cloned());
    writer.write_record(&header_row).map_err(|e| ExportError::Csv(e.to_string()))?;

    for (i, record) in records.iter().enumerate() {
        let mut row = Vec::with_capacity(headers.len() + 1);
        row.push((i + 1).to_string());
        row.extend(record_cells(record, &headers));
        writer.write_record(&row).map_err(|e| ExportError::Csv(e.to_string()))?;
    }

    writer.flush().map_err(|e| ExportError::Io(e.to_string()))?;
    log::info!("exported {} rows to csv", records.len());
    Ok(records.len())
}

pub fn export_records_to_path(records: &[StoredRecord], path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io(e.to_string()))?;
    export_records(records, file)
}
