use thiserror::Error;

/// Errors that can occur during sheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    /// Row and column numbers are 1-based; zero is never addressable.
    #[error("Cell out of bounds: row {row}, col {col}")]
    CellOutOfBounds { row: usize, col: usize },

    #[error("Row index out of bounds: {index} (sheet has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Invalid column letters: {0}")]
    InvalidColumn(String),

    #[error("Workbook error: {0}")]
    Workbook(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;
