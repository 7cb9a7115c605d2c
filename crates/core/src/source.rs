//! Remote tabular sources, as seen by the lead-time merge.

use crate::error::{ReconError, ReconResult};
use blindsops_sheet::a1_notation::column_letters_to_index;
use blindsops_sheet::Book;
use indexmap::IndexMap;
use std::path::Path;

/// Anything that can hand back a range of a spreadsheet as rows of text.
pub trait RangeSource {
    /// Fetch `range` (e.g. `Canberra!A:Z`) from spreadsheet `sheet_id`.
    fn fetch_range(&self, sheet_id: &str, range: &str) -> ReconResult<Vec<Vec<String>>>;
}

/// A parsed `Tab!A:Z` range. Columns are 0-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub tab: String,
    pub columns: Option<(usize, usize)>,
}

impl RangeSpec {
    /// Parse `Tab`, `Tab!A:Z` or `'Tab name'!B:D`.
    pub fn parse(range: &str) -> ReconResult<Self> {
        let invalid = || ReconError::InvalidRange(range.to_string());
        let (tab, cols) = match range.rsplit_once('!') {
            Some((tab, cols)) => (tab, Some(cols)),
            None => (range, None),
        };
        let tab = tab.trim();
        let tab = tab
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
            .unwrap_or(tab);
        if tab.is_empty() {
            return Err(invalid());
        }

        let columns = match cols {
            None => None,
            Some(cols) => {
                let (first, last) = cols.split_once(':').unwrap_or((cols, cols));
                let first = column_letters_to_index(first).map_err(|_| invalid())?;
                let last = column_letters_to_index(last).map_err(|_| invalid())?;
                Some((first.min(last), first.max(last)))
            }
        };
        Ok(Self {
            tab: tab.to_string(),
            columns,
        })
    }
}

/// Workbooks already on disk, keyed by the id a config refers to them by.
#[derive(Debug, Clone, Default)]
pub struct LocalWorkbooks {
    books: IndexMap<String, Book>,
}

impl LocalWorkbooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sheet_id: &str, book: Book) {
        self.books.insert(sheet_id.to_string(), book);
    }

    /// Load an XLSX file under `sheet_id`.
    pub fn load_xlsx(&mut self, sheet_id: &str, path: impl AsRef<Path>) -> ReconResult<()> {
        let book = Book::from_xlsx(path)?;
        self.insert(sheet_id, book);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, sheet_id: &str) -> bool {
        self.books.contains_key(sheet_id)
    }
}

impl RangeSource for LocalWorkbooks {
    fn fetch_range(&self, sheet_id: &str, range: &str) -> ReconResult<Vec<Vec<String>>> {
        let spec = RangeSpec::parse(range)?;
        let book = self
            .books
            .get(sheet_id)
            .ok_or_else(|| ReconError::SourceNotFound(sheet_id.to_string()))?;
        let sheet = book
            .get_sheet(&spec.tab)
            .map_err(|_| ReconError::SourceNotFound(format!("{sheet_id}/{}", spec.tab)))?;

        let rows = sheet.to_string_rows();
        let Some((first, last)) = spec.columns else {
            return Ok(rows);
        };
        Ok(rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .skip(first)
                    .take(last - first + 1)
                    .collect()
            })
            .collect())
    }
}
