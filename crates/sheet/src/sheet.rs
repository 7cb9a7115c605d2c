use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use std::collections::HashMap;

static NULL_CELL: CellValue = CellValue::Null;

/// A sheet representing a 2D grid of cells (row-major storage)
///
/// Addressing is spreadsheet-style and 1-based (`cell`/`set_cell`/`delete_rows`).
/// Rows may be ragged; a cell past the end of its row reads as [`CellValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
}

/// Header text of one row mapped to 1-based column numbers.
///
/// Keys are trimmed and upper-cased, so lookups are case-insensitive but
/// otherwise exact. The first column carrying a given header wins.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Look up the 1-based column for a header
    #[must_use]
    pub fn column(&self, header: &str) -> Option<usize> {
        self.columns.get(&header.trim().to_uppercase()).copied()
    }

}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        Sheet {
            name: "Sheet1".to_string(),
            data: converted,
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Width of the widest row
    fn col_count(&self) -> usize {
        self.data.iter().map(Vec::len).max().unwrap_or(0)
    }

    // ===== Spreadsheet Addressing (1-based) =====

    /// Highest populated row number (1-based); 0 for an empty sheet
    #[must_use]
    pub fn max_row(&self) -> usize {
        self.row_count()
    }

    /// Read a cell by 1-based row and column. Anything outside the
    /// populated grid (including row or column 0) reads as null.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        if row == 0 || col == 0 {
            return &NULL_CELL;
        }
        self.data
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .unwrap_or(&NULL_CELL)
    }

    /// Write a cell by 1-based row and column, growing the grid with
    /// null cells as needed.
    pub fn set_cell<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row == 0 || col == 0 {
            return Err(SheetError::CellOutOfBounds { row, col });
        }
        if self.data.len() < row {
            self.data.resize_with(row, Vec::new);
        }
        let cells = &mut self.data[row - 1];
        if cells.len() < col {
            cells.resize(col, CellValue::Null);
        }
        cells[col - 1] = value.into();
        Ok(())
    }

    /// Iterate rows `min_row..=max_row` (1-based, clamped to the sheet),
    /// yielding each row number alongside its cells.
    pub fn iter_rows(
        &self,
        min_row: usize,
        max_row: usize,
    ) -> impl Iterator<Item = (usize, &[CellValue])> + '_ {
        let start = min_row.max(1);
        let end = max_row.min(self.row_count());
        self.data
            .iter()
            .enumerate()
            .skip(start - 1)
            .take(end.saturating_sub(start - 1))
            .map(|(idx, row)| (idx + 1, row.as_slice()))
    }

    /// Delete `amount` rows starting at 1-based `start`; later rows shift up.
    ///
    /// Ranges running past the end are clamped. Returns the number of rows
    /// actually removed, so repeated calls with descending starts stay valid.
    pub fn delete_rows(&mut self, start: usize, amount: usize) -> Result<usize> {
        if start == 0 {
            return Err(SheetError::RowIndexOutOfBounds {
                index: start,
                count: self.row_count(),
            });
        }
        if start > self.row_count() || amount == 0 {
            return Ok(0);
        }
        let end = (start - 1 + amount).min(self.row_count());
        let removed = end - (start - 1);
        self.data.drain(start - 1..end);
        Ok(removed)
    }

    /// Build the header index for a 1-based row
    #[must_use]
    pub fn header_index(&self, row: usize) -> HeaderIndex {
        let mut columns = HashMap::new();
        if let Some(cells) = row.checked_sub(1).and_then(|r| self.data.get(r)) {
            for (idx, cell) in cells.iter().enumerate() {
                let key = cell.to_normalized_string().trim().to_uppercase();
                if !key.is_empty() {
                    columns.entry(key).or_insert(idx + 1);
                }
            }
        }
        HeaderIndex { columns }
    }

    pub(crate) fn data(&self) -> &[Vec<CellValue>] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }

    /// All cells rendered as strings, rows padded to the widest row.
    ///
    /// This is the shape remote tabular sources hand back.
    #[must_use]
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        let width = self.col_count();
        self.data
            .iter()
            .map(|row| {
                let mut cells: Vec<String> =
                    row.iter().map(CellValue::to_normalized_string).collect();
                cells.resize(width, String::new());
                cells
            })
            .collect()
    }
}
