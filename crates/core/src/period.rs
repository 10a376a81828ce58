// Period keys (YYYY-MM) and their display labels

use chrono::{Datelike, Month, NaiveDate};

/// Coarse period key for a date: `YYYY-MM`, zero-padded month.
pub fn derive_period(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Display label for a period key, e.g. `"2024-03"` -> `"March 2024"`.
/// Returns `None` if the key is not a valid `YYYY-MM`.
pub fn period_label(period: &str) -> Option<String> {
    let (year, month) = period.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u8 = month.parse().ok()?;
    let month = Month::try_from(month).ok()?;
    Some(format!("{} {}", month.name(), year))
}
