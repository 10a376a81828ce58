use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Content is not a readable workbook, or lacks a header plus data row.
    Malformed(String),
    /// Upload name does not carry an accepted spreadsheet extension.
    UnsupportedFileType(String),
    /// Every row after the header was blank.
    NoDataRows,
    /// IO error (file read, etc.).
    Io(String),
    /// The record sink rejected a record.
    Sink(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed input: {msg}"),
            Self::UnsupportedFileType(name) => {
                write!(f, "unsupported file type: '{name}' (only .xlsx and .xls are allowed)")
            }
            Self::NoDataRows => write!(f, "file contains no data rows"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Sink(msg) => write!(f, "record sink error: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}
