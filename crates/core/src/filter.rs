//! Filter pass: keep the sheets that mention any term, prune the rest.

use crate::compact::{apply_deletions, compact_ranges};
use crate::config::FilterConfig;
use crate::error::ReconResult;
use crate::scan::{scan, MatchRecord, ScanOptions};
use crate::text::TermSet;
use blindsops_sheet::{Book, CellValue, Sheet};
use indexmap::IndexMap;
use regex::Regex;

const PREVIEW_CHARS: usize = 200;

fn star_trail_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\*$").expect("valid regex"))
}

/// Switches for [`filter_book`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub search_sheet_names: bool,
    /// Delete non-matching data rows from kept sheets.
    pub prune_rows: bool,
    pub header_rows: usize,
    /// Strip a trailing `*` from the B2/C2 headers of kept sheets.
    pub inventory_items: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::from(&FilterConfig::default())
    }
}

impl From<&FilterConfig> for FilterOptions {
    fn from(config: &FilterConfig) -> Self {
        Self {
            search_sheet_names: config.search_sheet_names,
            prune_rows: config.prune_rows,
            header_rows: config.header_rows,
            inventory_items: false,
        }
    }
}

/// How a kept sheet qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Content,
    SheetName,
    Both,
}

impl std::fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchedBy::Content => "content",
            MatchedBy::SheetName => "sheet name",
            MatchedBy::Both => "content + sheet name",
        };
        f.write_str(label)
    }
}

/// Outcome for one kept sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetFilterSummary {
    pub name: String,
    pub matched_by: MatchedBy,
    pub matched_terms_preview: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub matching_rows: usize,
}

/// Per-sheet results of a filter pass, in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub sheets: Vec<SheetFilterSummary>,
    pub dropped: Vec<String>,
}

impl FilterReport {
    #[must_use]
    pub fn kept_count(&self) -> usize {
        self.sheets.len()
    }
}

/// Result of [`filter_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// At least one sheet survived; the book holds only those.
    Kept(FilterReport),
    /// Nothing matched. The book is left untouched and must not be saved.
    NoMatches(FilterReport),
}

impl FilterOutcome {
    #[must_use]
    pub fn report(&self) -> &FilterReport {
        match self {
            FilterOutcome::Kept(report) | FilterOutcome::NoMatches(report) => report,
        }
    }
}

/// True for InventoryItems exports, recognised by file name.
#[must_use]
pub fn is_inventory_items(file_name: &str) -> bool {
    file_name.to_lowercase().contains("inventoryitems")
}

/// Drop the required-field marker from the B2 and C2 headers.
fn strip_header_stars(sheet: &mut Sheet) -> ReconResult<()> {
    for col in [2, 3] {
        let CellValue::String(text) = sheet.cell(2, col) else {
            continue;
        };
        let stripped = star_trail_regex().replace(text, "");
        if stripped != text.as_str() {
            let stripped = stripped.into_owned();
            sheet.set_cell(2, col, stripped)?;
        }
    }
    Ok(())
}

fn terms_preview(record: &MatchRecord) -> String {
    let joined = record.matched_terms().join(", ");
    if joined.chars().count() <= PREVIEW_CHARS {
        return joined;
    }
    let mut cut: String = joined.chars().take(PREVIEW_CHARS - 1).collect();
    cut.push('…');
    cut
}

/// Drop sheets with no match and, optionally, their non-matching rows.
pub fn filter_book(
    book: &mut Book,
    terms: &TermSet,
    options: FilterOptions,
) -> ReconResult<FilterOutcome> {
    let scan_options = ScanOptions {
        search_sheet_names: options.search_sheet_names,
        header_rows: options.header_rows,
    };
    let records: IndexMap<String, MatchRecord> = book
        .sheets()
        .map(|(name, sheet)| (name.to_string(), scan(sheet, terms, scan_options)))
        .collect();

    let mut report = FilterReport::default();
    for (name, record) in &records {
        if !record.any_match() {
            report.dropped.push(name.clone());
        }
    }
    if report.dropped.len() == records.len() {
        tracing::info!(sheets = records.len(), "no sheet matched any term");
        return Ok(FilterOutcome::NoMatches(report));
    }

    book.retain_sheets(|name, _| records.get(name).is_some_and(MatchRecord::any_match));

    for (name, sheet) in book.sheets_mut() {
        let Some(record) = records.get(name) else {
            continue;
        };
        let rows_removed = if options.prune_rows {
            apply_deletions(sheet, &compact_ranges(&record.nonmatching_rows))?
        } else {
            0
        };
        if options.inventory_items {
            strip_header_stars(sheet)?;
        }
        let matched_by = match (record.content_match, record.sheet_name_match) {
            (true, true) => MatchedBy::Both,
            (true, false) => MatchedBy::Content,
            _ => MatchedBy::SheetName,
        };
        report.sheets.push(SheetFilterSummary {
            name: name.to_string(),
            matched_by,
            matched_terms_preview: terms_preview(record),
            rows_before: record.rows_before,
            rows_after: sheet.max_row(),
            rows_removed,
            matching_rows: record.matching_rows.len(),
        });
    }

    tracing::info!(
        kept = report.kept_count(),
        dropped = report.dropped.len(),
        "filtered workbook"
    );
    Ok(FilterOutcome::Kept(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindsops_sheet::Sheet;

    fn book() -> Book {
        let mut book = Book::new();
        book.add_sheet(
            "Orders",
            Sheet::from_data(vec![
                vec!["Fabric", "Qty"],
                vec!["Sanctuary Blockout", "2"],
                vec!["Vibe Screen", "1"],
                vec!["sanctuary  light", "4"],
                vec!["Other", "9"],
            ]),
        )
        .unwrap();
        book.add_sheet("Sanctuary notes", Sheet::from_data(vec![vec!["Heading"], vec!["nothing"]]))
            .unwrap();
        book.add_sheet("Misc", Sheet::from_data(vec![vec!["x"], vec!["y"]]))
            .unwrap();
        book
    }

    #[test]
    fn test_keeps_and_prunes() {
        let mut book = book();
        let terms = TermSet::from_lines("sanctuary\n\n", false);
        let outcome = filter_book(&mut book, &terms, FilterOptions::default()).unwrap();
        let FilterOutcome::Kept(report) = outcome else {
            panic!("expected kept sheets");
        };
        assert_eq!(book.sheet_names(), vec!["Orders", "Sanctuary notes"]);
        assert_eq!(report.kept_count(), 2);
        assert_eq!(report.dropped, vec!["Misc".to_string()]);

        let orders = &report.sheets[0];
        assert_eq!(orders.matched_by, MatchedBy::Content);
        assert_eq!(orders.rows_before, 5);
        assert_eq!(orders.rows_after, 3);
        assert_eq!(orders.rows_removed, 2);
        assert_eq!(orders.matching_rows, 2);
        assert_eq!(orders.matched_terms_preview, "sanctuary");

        let sheet = book.get_sheet("Orders").unwrap();
        assert_eq!(sheet.cell(1, 1).to_normalized_string(), "Fabric");
        assert_eq!(sheet.cell(3, 1).to_normalized_string(), "sanctuary  light");

        let notes = &report.sheets[1];
        assert_eq!(notes.matched_by, MatchedBy::SheetName);
        assert_eq!(notes.rows_after, 1);
        assert_eq!(notes.matched_by.to_string(), "sheet name");
    }

    #[test]
    fn test_without_pruning_rows_stay() {
        let mut book = book();
        let terms = TermSet::from_lines("vibe", false);
        let options = FilterOptions {
            prune_rows: false,
            ..FilterOptions::default()
        };
        let outcome = filter_book(&mut book, &terms, options).unwrap();
        assert_eq!(outcome.report().kept_count(), 1);
        assert_eq!(book.get_sheet("Orders").unwrap().max_row(), 5);
        assert_eq!(outcome.report().sheets[0].rows_removed, 0);
    }

    #[test]
    fn test_no_matches_leaves_book_alone() {
        let mut book = book();
        let terms = TermSet::from_lines("zebra", false);
        let outcome = filter_book(&mut book, &terms, FilterOptions::default()).unwrap();
        assert!(matches!(outcome, FilterOutcome::NoMatches(_)));
        assert_eq!(book.sheet_count(), 3);
    }

    #[test]
    fn test_case_sensitive_terms() {
        let mut book = book();
        let terms = TermSet::from_lines("Sanctuary", true);
        let options = FilterOptions {
            search_sheet_names: false,
            ..FilterOptions::default()
        };
        let FilterOutcome::Kept(report) = filter_book(&mut book, &terms, options).unwrap() else {
            panic!("expected kept sheets");
        };
        assert_eq!(book.sheet_names(), vec!["Orders"]);
        assert_eq!(report.sheets[0].matching_rows, 1);
    }

    #[test]
    fn test_preview_is_truncated() {
        let long: Vec<String> = (0..60).map(|i| format!("term{i:03}")).collect();
        let mut record = scan(&Sheet::new(), &TermSet::from_lines("", false), ScanOptions::default());
        record.content_terms = long.into_iter().collect();
        let preview = terms_preview(&record);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
        assert!(preview.starts_with("term000, term001"));
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_short_preview_is_untouched() {
        let mut record = scan(&Sheet::new(), &TermSet::from_lines("", false), ScanOptions::default());
        record.content_terms = ["vibe".to_string(), "linen".to_string()].into_iter().collect();
        assert_eq!(terms_preview(&record), "linen, vibe");
    }

    #[test]
    fn test_inventory_items_file_names() {
        assert!(is_inventory_items("Store_InventoryItems_2025.xlsx"));
        assert!(is_inventory_items("inventoryitems.xlsm"));
        assert!(!is_inventory_items("Inventory Items.xlsx"));
        assert!(!is_inventory_items("orders.xlsx"));
    }

    fn inventory_book() -> Book {
        let mut book = Book::new();
        book.add_sheet(
            "Items",
            Sheet::from_data(vec![
                vec![CellValue::from("Export"), CellValue::Null, CellValue::Null, CellValue::Null],
                vec![
                    CellValue::from("Code"),
                    CellValue::from("Description  *"),
                    CellValue::from("Supplier*"),
                    CellValue::from("Note *"),
                ],
                vec![
                    CellValue::from("R1"),
                    CellValue::from("Sanctuary roller"),
                    CellValue::from("Acme"),
                    CellValue::Null,
                ],
                vec![
                    CellValue::from("R2"),
                    CellValue::from("Vibe screen"),
                    CellValue::from("Acme"),
                    CellValue::Null,
                ],
            ]),
        )
        .unwrap();
        book
    }

    #[test]
    fn test_inventory_items_headers_lose_star() {
        let mut book = inventory_book();
        let terms = TermSet::from_lines("sanctuary", false);
        let options = FilterOptions {
            header_rows: 2,
            inventory_items: true,
            ..FilterOptions::default()
        };
        let outcome = filter_book(&mut book, &terms, options).unwrap();
        assert!(matches!(outcome, FilterOutcome::Kept(_)));

        let sheet = book.get_sheet("Items").unwrap();
        assert_eq!(sheet.cell(2, 2), &CellValue::from("Description"));
        assert_eq!(sheet.cell(2, 3), &CellValue::from("Supplier"));
        assert_eq!(sheet.cell(2, 4), &CellValue::from("Note *"));
        assert_eq!(sheet.cell(3, 2), &CellValue::from("Sanctuary roller"));
        assert_eq!(sheet.max_row(), 3);
    }

    #[test]
    fn test_other_workbooks_keep_star() {
        let mut book = inventory_book();
        let terms = TermSet::from_lines("sanctuary", false);
        let options = FilterOptions {
            header_rows: 2,
            ..FilterOptions::default()
        };
        filter_book(&mut book, &terms, options).unwrap();

        let sheet = book.get_sheet("Items").unwrap();
        assert_eq!(sheet.cell(2, 2), &CellValue::from("Description  *"));
        assert_eq!(sheet.cell(2, 3), &CellValue::from("Supplier*"));
    }
}
