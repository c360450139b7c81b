use thiserror::Error;

/// Main error type for sheet_parquet.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum SheetParquetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    DuckDBError(#[from] duckdb::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    GlobError(#[from] glob::GlobError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    RangeError(#[from] crate::spreadsheet::range::RangeError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    // Writer module errors
    #[error("{0}")]
    WriterError(#[from] crate::writer::WriterError),
}

pub type Result<T, E = SheetParquetError> = std::result::Result<T, E>;

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetParquetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetParquetError::WithContextError(format!("{}: {}", message, e)))
    }
}
