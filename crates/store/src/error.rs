use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// SQLite error.
    Sqlite(rusqlite::Error),
    /// Stored JSON could not be encoded or decoded.
    Json(String),
    /// No row with this id.
    NotFound { kind: &'static str, id: i64 },
    /// Bad pagination or filter values.
    InvalidQuery(String),
    /// IO error (creating the database directory, etc.).
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "database error: {e}"),
            Self::Json(msg) => write!(f, "stored data error: {msg}"),
            Self::NotFound { kind, id } => write!(f, "{kind} {id} not found"),
            Self::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
