// Grid reader: spreadsheet bytes -> header row + data rows
//
// Only the first worksheet is read. Cells are flattened to trimmed strings;
// typed values (numbers, dates, booleans) are rendered the same way the
// import path renders them for display.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;

use crate::error::IngestError;

/// Parsed tabular content of one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Placeholder name for a column whose header is blank (1-based position).
pub fn placeholder_header(index: usize) -> String {
    format!("Column_{}", index + 1)
}

/// Parse spreadsheet bytes (xlsx, xlsm, xlsb, xls, ods) into a [`Grid`].
pub fn parse(bytes: &[u8]) -> Result<Grid, IngestError> {
    // The workbook handle lives only inside this scope, so it is released on
    // every return path including the error ones.
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Malformed(format!("cannot open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Malformed("workbook contains no sheets".to_string()))?
        .map_err(|e| IngestError::Malformed(format!("cannot read first sheet: {e}")))?;

    // The range begins at the first non-empty cell; pad back to A1 so row 0
    // and column A keep their positions.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (start_row, start_col) = (start_row as usize, start_col as usize);
    let total_rows = if range.is_empty() { 0 } else { start_row + range.height() };
    if total_rows < 2 {
        return Err(IngestError::Malformed(
            "file must contain a header row and at least one data row".to_string(),
        ));
    }
    let width = start_col + range.width();

    let mut raw_rows = std::iter::repeat_with(|| vec![String::new(); width])
        .take(start_row)
        .chain(range.rows().map(|row| {
            let mut cells = vec![String::new(); start_col];
            cells.extend(row.iter().map(cell_to_string));
            cells
        }));

    let header_row = raw_rows.next().unwrap_or_default();
    let headers: Vec<String> = header_row
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            if text.trim().is_empty() {
                placeholder_header(i)
            } else {
                text
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut skipped_blank = 0usize;
    for row in raw_rows {
        let cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            skipped_blank += 1;
            continue;
        }
        rows.push(cells);
    }

    log::debug!(
        "parsed grid: {} columns, {} rows ({} blank rows skipped)",
        headers.len(),
        rows.len(),
        skipped_blank
    );

    Ok(Grid { headers, rows })
}

/// Read a spreadsheet from disk and parse it.
pub fn parse_path(path: &Path) -> Result<Grid, IngestError> {
    let bytes = std::fs::read(path)
        .map_err(|e| IngestError::Io(format!("cannot read {}: {e}", path.display())))?;
    parse(&bytes)
}

/// Render a cell as text. Blank cells become the empty string.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return format!("{}", dt.as_f64());
            }
            match dt.as_datetime() {
                // Serials below one day carry no date part
                Some(value) if dt.as_f64() < 1.0 => value.format("%H:%M:%S").to_string(),
                Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => format!("{}", dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn headers_and_rows_are_split() {
        let bytes = workbook_bytes(&[&["Name", "City"], &["Alice", "Tashkent"], &["Bob", "Samarkand"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.headers, vec!["Name", "City"]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1], vec!["Bob", "Samarkand"]);
    }

    #[test]
    fn blank_header_gets_placeholder() {
        let bytes = workbook_bytes(&[&["Name", "", "Total"], &["Alice", "x", "3"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.headers, vec!["Name", "Column_2", "Total"]);
    }

    #[test]
    fn blank_rows_are_dropped() {
        let bytes = workbook_bytes(&[&["A", "B"], &["1", "2"], &["   ", ""], &["3", "4"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn cells_are_trimmed() {
        let bytes = workbook_bytes(&[&["A", "B"], &["  padded ", "x"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.rows[0][0], "padded");
    }

    #[test]
    fn header_only_is_malformed() {
        let bytes = workbook_bytes(&[&["Name", "Date"]]);
        assert!(matches!(parse(&bytes), Err(IngestError::Malformed(_))));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = parse(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, IngestError::Malformed(_)));
    }

    #[test]
    fn typed_cells_are_stringified() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Qty").unwrap();
        sheet.write_string(0, 1, "Price").unwrap();
        sheet.write_string(0, 2, "Paid").unwrap();
        sheet.write_string(0, 3, "When").unwrap();
        sheet.write_number(1, 0, 3.0).unwrap();
        sheet.write_number(1, 1, 2.5).unwrap();
        sheet.write_boolean(1, 2, true).unwrap();
        let date = ExcelDateTime::from_ymd(2024, 3, 15).unwrap();
        let fmt = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_datetime_with_format(1, 3, &date, &fmt).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.rows[0], vec!["3", "2.5", "True", "2024-03-15 00:00:00"]);
    }

    #[test]
    fn time_only_cells_drop_the_date() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Opened").unwrap();
        let time = ExcelDateTime::from_hms(14, 30, 5).unwrap();
        let fmt = Format::new().set_num_format("hh:mm:ss");
        sheet.write_datetime_with_format(1, 0, &time, &fmt).unwrap();
        sheet.write_boolean(2, 0, false).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.rows, vec![vec!["14:30:05"], vec!["False"]]);
    }

    #[test]
    fn blank_leading_row_becomes_placeholder_header() {
        let bytes = workbook_bytes(&[&[], &["Name", "Date"], &["Alice", "01.03.2024"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.headers, vec!["Column_1", "Column_2"]);
        assert_eq!(
            grid.rows,
            vec![vec!["Name", "Date"], vec!["Alice", "01.03.2024"]]
        );
    }

    #[test]
    fn blank_leading_column_is_kept() {
        let bytes = workbook_bytes(&[&["", "Name"], &["", "Alice"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.headers, vec!["Column_1", "Name"]);
        assert_eq!(grid.rows, vec![vec!["", "Alice"]]);
    }

    #[test]
    fn header_on_second_row_counts_as_data() {
        let bytes = workbook_bytes(&[&[], &["Name", "Date"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.headers, vec!["Column_1", "Column_2"]);
        assert_eq!(grid.rows, vec![vec!["Name", "Date"]]);
    }

    #[test]
    fn empty_sheet_is_malformed() {
        let bytes = workbook_bytes(&[]);
        assert!(matches!(parse(&bytes), Err(IngestError::Malformed(_))));
    }

    #[test]
    fn short_rows_keep_their_width() {
        // Used range is rectangular, so a row shorter in content still spans
        // the full width with blank trailing cells.
        let bytes = workbook_bytes(&[&["A", "B", "C"], &["1"]]);
        let grid = parse(&bytes).unwrap();
        assert_eq!(grid.rows[0], vec!["1", "", ""]);
    }
}
