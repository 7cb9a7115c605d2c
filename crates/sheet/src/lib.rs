//! Sheet/Book model for blindsops
//!
//! Holds the in-memory shape of a spreadsheet workbook: ordered named sheets,
//! each a grid of loosely typed cells addressed spreadsheet-style, 1-based
//! (`cell`/`set_cell`/`delete_rows`). Workbooks load from and save to
//! XLSX/XLSM through calamine and rust_xlsxwriter.
//!
//! # Examples
//!
//! ```
//! use blindsops_sheet::{Book, CellValue, Sheet};
//!
//! let mut sheet = Sheet::from_data(vec![
//!     vec!["Product", "Code"],
//!     vec!["Roller", "ROLL"],
//!     vec!["Venetian", "VEN"],
//! ]);
//! assert_eq!(sheet.cell(2, 2), &CellValue::from("ROLL"));
//!
//! sheet.delete_rows(2, 1).unwrap();
//! assert_eq!(sheet.cell(2, 1), &CellValue::from("Venetian"));
//!
//! let mut book = Book::new();
//! book.add_sheet("Products", sheet).unwrap();
//! assert_eq!(book.sheet_count(), 1);
//! ```

pub mod a1_notation;
mod book;
mod cell;
mod error;
mod sheet;
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet types.
pub use sheet::{HeaderIndex, Sheet};
