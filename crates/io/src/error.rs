use std::fmt;

#[derive(Debug)]
pub enum ExportError {
    /// No records matched; nothing to write.
    NoData,
    /// Workbook construction or save failed.
    Xlsx(String),
    /// CSV writer error.
    Csv(String),
    /// IO error (file write, etc.).
    Io(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "no data to export"),
            Self::Xlsx(msg) => write!(f, "XLSX export error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV export error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}
