//! Date extraction from free-form row content.
//!
//! A row carries at most one semantic date. It is found by scanning the
//! row's cells in order and, for each cell, trying a fixed, ordered list of
//! patterns. The first pattern that yields a real calendar date with a year in
//! `[MIN_YEAR, MAX_YEAR]` wins; nothing here ever returns an error.
//!
//! Slash dates are month-first and dash dates are day-first. A digit triple
//! like `03-04-2024` and `03/04/2024` therefore resolves to different dates.
//! Precedence is pattern order, then cell order, with no attempt at
//! cross-checking.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Lowest accepted year (inclusive).
pub const MIN_YEAR: i32 = 2000;
/// Highest accepted year (inclusive).
pub const MAX_YEAR: i32 = 2100;

/// Which capture group holds which date component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// year, month, day
    Ymd,
    /// day, month, year
    Dmy,
    /// month, day, year
    Mdy,
}

impl FieldOrder {
    fn build(self, a: u32, b: u32, c: u32) -> Option<NaiveDate> {
        let (year, month, day) = match self {
            FieldOrder::Ymd => (a, b, c),
            FieldOrder::Dmy => (c, b, a),
            FieldOrder::Mdy => (c, a, b),
        };
        NaiveDate::from_ymd_opt(year as i32, month, day)
    }
}

/// One entry in the ordered pattern list.
#[derive(Debug)]
pub struct DatePattern {
    /// Human-readable shape, e.g. `D.M.YYYY`.
    pub name: &'static str,
    pub regex: Regex,
    pub order: FieldOrder,
}

impl DatePattern {
    fn new(name: &'static str, pattern: &str, order: FieldOrder) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
            order,
        }
    }

    /// Leftmost match in `text`, converted to a date. Invalid calendar dates
    /// and out-of-range years are `None`.
    pub fn apply(&self, text: &str) -> Option<NaiveDate> {
        let caps = self.regex.captures(text)?;
        let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let date = self.order.build(field(1)?, field(2)?, field(3)?)?;
        in_range(date).then_some(date)
    }
}

/// Patterns in priority order.
pub static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        DatePattern::new("YYYY-M-D", r"(\d{4})-(\d{1,2})-(\d{1,2})", FieldOrder::Ymd),
        DatePattern::new("D.M.YYYY", r"(\d{1,2})\.(\d{1,2})\.(\d{4})", FieldOrder::Dmy),
        DatePattern::new("M/D/YYYY", r"(\d{1,2})/(\d{1,2})/(\d{4})", FieldOrder::Mdy),
        DatePattern::new("D-M-YYYY", r"(\d{1,2})-(\d{1,2})-(\d{4})", FieldOrder::Dmy),
    ]
});

fn in_range(date: NaiveDate) -> bool {
    use chrono::Datelike;
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// First date found in a single cell, trying every pattern in order.
pub fn extract_date_from_cell(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    DATE_PATTERNS.iter().find_map(|p| p.apply(cell))
}

/// First date found in a row, scanning cells left to right.
pub fn extract_date<S: AsRef<str>>(row: &[S]) -> Option<NaiveDate> {
    row.iter().find_map(|cell| extract_date_from_cell(cell.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn iso_like() {
        assert_eq!(extract_date(&["2099-01-01"]), Some(d(2099, 1, 1)));
        assert_eq!(extract_date(&["2024-3-5"]), Some(d(2024, 3, 5)));
    }

    #[test]
    fn year_bounds() {
        assert_eq!(extract_date(&["1899-01-01"]), None);
        assert_eq!(extract_date(&["1999-12-31"]), None);
        assert_eq!(extract_date(&["2000-01-01"]), Some(d(2000, 1, 1)));
        assert_eq!(extract_date(&["2100-12-31"]), Some(d(2100, 12, 31)));
        assert_eq!(extract_date(&["2101-01-01"]), None);
    }

    #[test]
    fn dotted_is_day_first() {
        assert_eq!(extract_date(&["01.03.2024"]), Some(d(2024, 3, 1)));
    }

    #[test]
    fn slash_is_month_first_dash_is_day_first() {
        assert_eq!(extract_date(&["03/04/2024"]), Some(d(2024, 3, 4)));
        assert_eq!(extract_date(&["03-04-2024"]), Some(d(2024, 4, 3)));
    }

    #[test]
    fn embedded_in_text() {
        assert_eq!(
            extract_date(&["Delivered on 15.06.2023 by courier"]),
            Some(d(2023, 6, 15))
        );
        assert_eq!(
            extract_date(&["2024-02-10 00:00:00"]),
            Some(d(2024, 2, 10))
        );
    }

    #[test]
    fn invalid_calendar_date_falls_through() {
        // 31.02 is not a date; 4/5/2024 later in the same cell is
        assert_eq!(extract_date(&["31.02.2024 or 4/5/2024"]), Some(d(2024, 4, 5)));
        assert_eq!(extract_date(&["13/13/2024"]), None);
    }

    #[test]
    fn first_matching_cell_wins() {
        let row = ["Alice", "", "2023-01-02", "05.06.2024"];
        assert_eq!(extract_date(&row), Some(d(2023, 1, 2)));
    }

    #[test]
    fn out_of_range_cell_is_skipped_for_next_cell() {
        let row = ["1990-05-05", "07.08.2022"];
        assert_eq!(extract_date(&row), Some(d(2022, 8, 7)));
    }

    #[test]
    fn pattern_priority_within_cell() {
        // Pattern 1 is tried before pattern 3 even though the slash date
        // appears first in the text
        assert_eq!(extract_date(&["1/2/2024 2025-06-07"]), Some(d(2025, 6, 7)));
    }

    #[test]
    fn no_date() {
        assert_eq!(extract_date(&["hello", "42", ""]), None);
        let empty: [&str; 0] = [];
        assert_eq!(extract_date(&empty), None);
    }

    #[test]
    fn pattern_list_order_is_fixed() {
        let names: Vec<_> = DATE_PATTERNS.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["YYYY-M-D", "D.M.YYYY", "M/D/YYYY", "D-M-YYYY"]);
    }
}
