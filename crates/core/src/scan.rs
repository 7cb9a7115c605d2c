//! Term/row scanner.
//!
//! Matches every cell of a sheet against a [`TermSet`] by substring and
//! records which data rows matched, for the filter pass to keep or prune.

use crate::text::{fold, TermSet};
use blindsops_sheet::Sheet;
use indexmap::IndexSet;

/// Scan behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Also match terms against the sheet title.
    pub search_sheet_names: bool,
    /// Rows `1..=header_rows` are scanned but never listed as data rows.
    pub header_rows: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            search_sheet_names: true,
            header_rows: 1,
        }
    }
}

/// What one scan found in one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub sheet_name_match: bool,
    pub content_match: bool,
    /// Terms found in the sheet title.
    pub name_terms: IndexSet<String>,
    /// Terms found in cell content, header rows included.
    pub content_terms: IndexSet<String>,
    /// 1-based data rows with at least one matching cell, ascending.
    pub matching_rows: Vec<usize>,
    /// 1-based data rows with no matching cell, ascending.
    pub nonmatching_rows: Vec<usize>,
    /// Row count before any pruning.
    pub rows_before: usize,
}

impl MatchRecord {
    /// True when the sheet should survive a filter pass.
    #[must_use]
    pub fn any_match(&self) -> bool {
        self.sheet_name_match || self.content_match
    }

    /// Union of name and content terms, sorted.
    #[must_use]
    pub fn matched_terms(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self
            .name_terms
            .iter()
            .chain(self.content_terms.iter())
            .map(String::as_str)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        all.sort_unstable();
        all
    }
}

/// Scan `sheet` against `terms`.
///
/// Case folding follows the term set. Header rows can flip
/// `content_match` but are not listed in either row list.
#[must_use]
pub fn scan(sheet: &Sheet, terms: &TermSet, options: ScanOptions) -> MatchRecord {
    let case_sensitive = terms.case_sensitive();

    let mut name_terms = IndexSet::new();
    if options.search_sheet_names {
        let title = fold(sheet.name(), case_sensitive);
        name_terms.extend(terms.matches_in(&title).map(str::to_string));
    }

    let first_data_row = options.header_rows + 1;
    let mut content_terms = IndexSet::new();
    let mut matching_rows = Vec::new();
    let mut nonmatching_rows = Vec::new();

    for (row_no, cells) in sheet.iter_rows(1, sheet.max_row()) {
        let mut row_hit = false;
        for cell in cells {
            if cell.is_null() {
                continue;
            }
            let text = fold(&cell.to_normalized_string(), case_sensitive);
            if text.is_empty() {
                continue;
            }
            for term in terms.matches_in(&text) {
                content_terms.insert(term.to_string());
                row_hit = true;
            }
        }
        if row_no >= first_data_row {
            if row_hit {
                matching_rows.push(row_no);
            } else {
                nonmatching_rows.push(row_no);
            }
        }
    }

    let record = MatchRecord {
        sheet_name_match: !name_terms.is_empty(),
        content_match: !content_terms.is_empty(),
        name_terms,
        content_terms,
        matching_rows,
        nonmatching_rows,
        rows_before: sheet.max_row(),
    };
    tracing::debug!(
        sheet = sheet.name(),
        content = record.content_match,
        name = record.sheet_name_match,
        rows = record.matching_rows.len(),
        "scanned sheet"
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindsops_sheet::{Book, CellValue};

    fn fabrics() -> Sheet {
        let mut book = Book::new();
        let sheet = Sheet::from_data(vec![
            vec![CellValue::from("Code"), CellValue::from("Linen notes")],
            vec![CellValue::from("A1"), CellValue::from("Sanctuary Linen")],
            vec![CellValue::from("A2"), CellValue::Null],
            vec![CellValue::from("A3"), CellValue::from("LINEN look")],
            vec![CellValue::Int(42), CellValue::from("Screen")],
        ]);
        book.add_sheet("Roller Fabrics", sheet).unwrap();
        book.get_sheet("Roller Fabrics").unwrap().clone()
    }

    #[test]
    fn test_content_rows_split() {
        let terms = TermSet::from_lines("linen", false);
        let rec = scan(&fabrics(), &terms, ScanOptions::default());
        assert!(rec.content_match);
        assert!(!rec.sheet_name_match);
        assert_eq!(rec.matching_rows, vec![2, 4]);
        assert_eq!(rec.nonmatching_rows, vec![3, 5]);
        assert_eq!(rec.rows_before, 5);
    }

    #[test]
    fn test_case_sensitive_scan() {
        let terms = TermSet::from_lines("LINEN", true);
        let rec = scan(&fabrics(), &terms, ScanOptions::default());
        assert_eq!(rec.matching_rows, vec![4]);
    }

    #[test]
    fn test_header_only_match_flips_content() {
        let terms = TermSet::from_lines("notes", false);
        let rec = scan(&fabrics(), &terms, ScanOptions::default());
        assert!(rec.content_match);
        assert!(rec.matching_rows.is_empty());
        assert_eq!(rec.nonmatching_rows, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_sheet_name_terms_tracked_separately() {
        let terms = TermSet::from_lines("roller\nscreen", false);
        let rec = scan(&fabrics(), &terms, ScanOptions::default());
        assert!(rec.sheet_name_match);
        assert_eq!(rec.name_terms.iter().collect::<Vec<_>>(), vec!["roller"]);
        assert_eq!(rec.content_terms.iter().collect::<Vec<_>>(), vec!["screen"]);
        assert_eq!(rec.matched_terms(), vec!["roller", "screen"]);

        let no_names = ScanOptions {
            search_sheet_names: false,
            ..ScanOptions::default()
        };
        assert!(!scan(&fabrics(), &terms, no_names).sheet_name_match);
    }

    #[test]
    fn test_numbers_match_as_text() {
        let terms = TermSet::from_lines("42", false);
        let rec = scan(&fabrics(), &terms, ScanOptions::default());
        assert_eq!(rec.matching_rows, vec![5]);
    }

    #[test]
    fn test_zero_header_rows_lists_row_one() {
        let terms = TermSet::from_lines("code", false);
        let opts = ScanOptions {
            search_sheet_names: false,
            header_rows: 0,
        };
        let rec = scan(&fabrics(), &terms, opts);
        assert_eq!(rec.matching_rows, vec![1]);
    }
}
