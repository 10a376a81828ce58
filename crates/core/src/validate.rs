// Structure validation: per-column type tallies for a parsed grid

use std::collections::BTreeMap;

use serde::Serialize;

use crate::date::extract_date_from_cell;
use crate::grid::placeholder_header;

/// Cell counts for one column. Every observed cell lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnTypes {
    pub numeric: usize,
    pub text: usize,
    pub date: usize,
}

impl ColumnTypes {
    pub fn total(&self) -> usize {
        self.numeric + self.text + self.date
    }
}

/// Classification of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Numeric,
    Date,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub total_columns: usize,
    pub total_rows: usize,
    pub empty_cells: usize,
    pub has_dates: bool,
    pub column_types: BTreeMap<String, ColumnTypes>,
}

/// Numeric wins over date, date over text. Blank cells are text.
pub fn classify_cell(cell: &str) -> CellKind {
    if is_numeric(cell.trim()) {
        CellKind::Numeric
    } else if extract_date_from_cell(cell).is_some() {
        CellKind::Date
    } else {
        CellKind::Text
    }
}

/// Float syntax plus digit-group underscores (`1_000.5`). An underscore
/// must sit between two digits.
fn is_numeric(text: &str) -> bool {
    if !text.contains('_') {
        return text.parse::<f64>().is_ok();
    }
    let bytes = text.as_bytes();
    let grouped = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'_'
            || (i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit())
    });
    grouped && text.replace('_', "").parse::<f64>().is_ok()
}

pub fn validate_structure<S: AsRef<str>>(headers: &[String], rows: &[Vec<S>]) -> StructureReport {
    let mut report = StructureReport {
        total_columns: headers.len(),
        total_rows: rows.len(),
        ..Default::default()
    };

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let cell = cell.as_ref();
            if cell.trim().is_empty() {
                report.empty_cells += 1;
            }

            let column = match headers.get(i) {
                Some(name) => name.clone(),
                None => placeholder_header(i),
            };
            let counts = report.column_types.entry(column).or_default();

            match classify_cell(cell) {
                CellKind::Numeric => counts.numeric += 1,
                CellKind::Date => {
                    counts.date += 1;
                    report.has_dates = true;
                }
                CellKind::Text => counts.text += 1,
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classifies_cells() {
        assert_eq!(classify_cell("42"), CellKind::Numeric);
        assert_eq!(classify_cell(" -3.5e2 "), CellKind::Numeric);
        assert_eq!(classify_cell("01.03.2024"), CellKind::Date);
        assert_eq!(classify_cell("2024-03-01"), CellKind::Date);
        assert_eq!(classify_cell("coffee"), CellKind::Text);
        assert_eq!(classify_cell(""), CellKind::Text);
    }

    #[test]
    fn digit_group_underscores() {
        assert_eq!(classify_cell("1_000"), CellKind::Numeric);
        assert_eq!(classify_cell("1_000.25"), CellKind::Numeric);
        assert_eq!(classify_cell("_1"), CellKind::Text);
        assert_eq!(classify_cell("1_"), CellKind::Text);
        assert_eq!(classify_cell("1__0"), CellKind::Text);
        assert_eq!(classify_cell("1._5"), CellKind::Text);
    }

    #[test]
    fn tallies_per_column() {
        let h = headers(&["Name", "Date", "Qty"]);
        let rows = vec![
            vec!["Alice", "01.03.2024", "3"],
            vec!["Bob", "", "4.5"],
            vec!["Carol", "5/6/2024", "n/a"],
        ];
        let report = validate_structure(&h, &rows);

        assert_eq!(report.total_columns, 3);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.empty_cells, 1);
        assert!(report.has_dates);
        assert_eq!(report.column_types["Name"], ColumnTypes { numeric: 0, text: 3, date: 0 });
        assert_eq!(report.column_types["Date"], ColumnTypes { numeric: 0, text: 1, date: 2 });
        assert_eq!(report.column_types["Qty"], ColumnTypes { numeric: 2, text: 1, date: 0 });

        for counts in report.column_types.values() {
            assert_eq!(counts.total(), report.total_rows);
        }
    }

    #[test]
    fn extra_cells_use_placeholder_column() {
        let h = headers(&["Only"]);
        let rows = vec![vec!["a", "b"]];
        let report = validate_structure(&h, &rows);
        assert_eq!(report.column_types["Column_2"].text, 1);
    }

    #[test]
    fn no_dates() {
        let h = headers(&["A"]);
        let rows = vec![vec!["1"], vec!["x"]];
        let report = validate_structure(&h, &rows);
        assert!(!report.has_dates);
        assert_eq!(report.empty_cells, 0);
    }
}
