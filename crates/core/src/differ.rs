//! Encoded-list differ for group-options upload workbooks.
//!
//! Each configured sheet carries two lists below a fixed start row: bare
//! fabric names (prefixed `YES|` on Flex sheets) and `fabric|colour|code`
//! triples. Both are compared against the inventory store and, when they
//! disagree, rewritten wholesale from it.

use crate::config::{GroupOptionsConfig, GroupSheet};
use crate::error::{ReconError, ReconResult};
use crate::store::InventoryStore;
use crate::text::norm_text;
use blindsops_sheet::{Book, CellValue, Sheet};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use std::fmt;

/// Marker in front of bare names on Flex sheets.
pub const FLEX_MARKER: &str = "YES|";
/// Title of the sheet emitted when nothing changed.
pub const NO_CHANGES_SHEET: &str = "NO_CHANGES";
/// A1 text of the placeholder sheet.
pub const NO_CHANGES_TEXT: &str = "No changes detected";

/// Comparison key for a bare name: normalized and lower-cased.
#[must_use]
pub fn name_key(name: &str) -> String {
    norm_text(name).to_lowercase()
}

/// A `(name, attribute, code)` record as it should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub name: String,
    pub attribute: String,
    pub code: String,
}

impl Triple {
    /// Build a triple; name and attribute are normalized, the code trimmed.
    #[must_use]
    pub fn new(name: &str, attribute: &str, code: &str) -> Self {
        Self {
            name: norm_text(name),
            attribute: norm_text(attribute),
            code: code.trim().to_string(),
        }
    }

    #[must_use]
    pub fn key(&self) -> TripleKey {
        TripleKey {
            name: name_key(&self.name),
            attribute: name_key(&self.attribute),
            code: self.code.trim().to_string(),
        }
    }

    /// The pipe-joined cell text.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}|{}|{}", self.name, self.attribute, self.code)
    }
}

/// Normalized triple used for set comparison.
///
/// Name and attribute compare case-insensitively; the code is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripleKey {
    pub name: String,
    pub attribute: String,
    pub code: String,
}

impl TripleKey {
    /// Decode a cell. Text without `|` is not a triple; a missing third
    /// part gives an empty code.
    #[must_use]
    pub fn parse(cell: &str) -> Option<Self> {
        let text = cell.trim();
        if !text.contains('|') {
            return None;
        }
        let mut parts = text.split('|').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let attribute = parts.next().unwrap_or_default();
        let code = parts.next().unwrap_or_default();
        Some(Self {
            name: name_key(name),
            attribute: name_key(attribute),
            code: code.to_string(),
        })
    }
}

impl fmt::Display for TripleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.name, self.attribute, self.code)
    }
}

/// Both encoded lists of one sheet, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedLists {
    pub names: BTreeSet<String>,
    pub triples: BTreeSet<TripleKey>,
}

impl EncodedLists {
    /// The lists an authoritative triple set implies.
    #[must_use]
    pub fn from_triples(triples: &[Triple]) -> Self {
        Self {
            names: triples
                .iter()
                .map(|t| name_key(&t.name))
                .filter(|n| !n.is_empty())
                .collect(),
            triples: triples.iter().map(Triple::key).collect(),
        }
    }
}

/// 1-based columns of the two lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListColumns {
    pub names: usize,
    pub triples: usize,
}

/// Find both list columns by exact, case-insensitive header text in row 1.
pub fn locate_columns(sheet: &Sheet, config: &GroupOptionsConfig) -> ReconResult<ListColumns> {
    let headers = sheet.header_index(1);
    match (
        headers.column(&config.name_header),
        headers.column(&config.triple_header),
    ) {
        (Some(names), Some(triples)) => Ok(ListColumns { names, triples }),
        (names, triples) => {
            let mut missing = Vec::new();
            if names.is_none() {
                missing.push(config.name_header.clone());
            }
            if triples.is_none() {
                missing.push(config.triple_header.clone());
            }
            Err(ReconError::MissingHeaders {
                sheet: sheet.name().to_string(),
                missing,
            })
        }
    }
}

fn strip_flex_marker(text: &str) -> &str {
    let text = text.trim();
    match text.get(..FLEX_MARKER.len()) {
        Some(head) if head.eq_ignore_ascii_case(FLEX_MARKER) => text[FLEX_MARKER.len()..].trim(),
        _ => text,
    }
}

/// Cells of one column from `start_row` down to the first blank cell.
fn column_run(sheet: &Sheet, col: usize, start_row: usize) -> impl Iterator<Item = String> + '_ {
    (start_row..=sheet.max_row())
        .map(move |row| sheet.cell(row, col))
        .take_while(|cell| !cell.is_blank())
        .map(CellValue::to_normalized_string)
}

/// Read both lists as they currently stand in the sheet.
#[must_use]
pub fn read_lists(sheet: &Sheet, cols: ListColumns, start_row: usize, flex: bool) -> EncodedLists {
    let names = column_run(sheet, cols.names, start_row)
        .map(|text| {
            let bare = if flex { strip_flex_marker(&text) } else { text.trim() };
            name_key(bare)
        })
        .filter(|name| !name.is_empty())
        .collect();
    let triples = column_run(sheet, cols.triples, start_row)
        .filter_map(|text| TripleKey::parse(&text))
        .collect();
    EncodedLists { names, triples }
}

/// What one sheet needs to match the store. Names and triples are the
/// normalized comparison keys, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetChanges {
    pub names_added: Vec<String>,
    pub names_removed: Vec<String>,
    pub triples_added: Vec<TripleKey>,
    pub triples_removed: Vec<TripleKey>,
}

impl SheetChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names_added.is_empty()
            && self.names_removed.is_empty()
            && self.triples_added.is_empty()
            && self.triples_removed.is_empty()
    }
}

/// `added = authoritative - current`, `removed = current - authoritative`.
#[must_use]
pub fn diff(authoritative: &EncodedLists, current: &EncodedLists) -> SheetChanges {
    SheetChanges {
        names_added: authoritative.names.difference(&current.names).cloned().collect(),
        names_removed: current.names.difference(&authoritative.names).cloned().collect(),
        triples_added: authoritative
            .triples
            .difference(&current.triples)
            .cloned()
            .collect(),
        triples_removed: current
            .triples
            .difference(&authoritative.triples)
            .cloned()
            .collect(),
    }
}

/// Clear both list columns from `start_row` to the sheet end and write the
/// authoritative lists: names deduplicated and sorted by normalized name,
/// triples deduplicated and sorted by `(name, attribute, code)`.
pub fn write_lists(
    sheet: &mut Sheet,
    cols: ListColumns,
    start_row: usize,
    flex: bool,
    authoritative: &[Triple],
) -> ReconResult<()> {
    for row in start_row..=sheet.max_row() {
        sheet.set_cell(row, cols.names, CellValue::Null)?;
        sheet.set_cell(row, cols.triples, CellValue::Null)?;
    }

    let mut names: IndexMap<String, &str> = IndexMap::new();
    for triple in authoritative {
        let key = name_key(&triple.name);
        if !key.is_empty() {
            names.entry(key).or_insert(triple.name.as_str());
        }
    }
    names.sort_keys();
    for (offset, name) in names.values().enumerate() {
        let text = if flex {
            format!("{FLEX_MARKER}{name}")
        } else {
            (*name).to_string()
        };
        sheet.set_cell(start_row + offset, cols.names, text)?;
    }

    let mut triples: IndexMap<TripleKey, &Triple> = IndexMap::new();
    for triple in authoritative {
        triples.entry(triple.key()).or_insert(triple);
    }
    triples.sort_keys();
    for (offset, triple) in triples.values().enumerate() {
        sheet.set_cell(start_row + offset, cols.triples, triple.encode())?;
    }
    Ok(())
}

/// Outcome of one configured sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetStatus {
    MissingInInput,
    Unchanged { names: usize, triples: usize },
    Changed(SheetChanges),
    Failed(String),
}

/// Per-sheet outcomes in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub sheets: IndexMap<String, SheetStatus>,
}

impl SyncReport {
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.sheets
            .values()
            .filter(|s| matches!(s, SheetStatus::Changed(_)))
            .count()
    }

    /// Sheets that could not be processed, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sheets.iter().filter_map(|(name, status)| match status {
            SheetStatus::Failed(reason) => Some((name.as_str(), reason.as_str())),
            _ => None,
        })
    }
}

/// Corrected workbook plus report.
#[derive(Debug, Clone)]
pub struct SyncOutput {
    /// Changed sheets only, or the `NO_CHANGES` placeholder.
    pub book: Book,
    pub report: SyncReport,
}

fn sync_sheet(
    sheet: &Sheet,
    spec: &GroupSheet,
    store: &dyn InventoryStore,
    config: &GroupOptionsConfig,
) -> ReconResult<(SheetStatus, Option<Sheet>)> {
    let cols = locate_columns(sheet, config)?;
    let authoritative = store.blockout_triples(&spec.group)?;
    let current = read_lists(sheet, cols, config.start_row, spec.flex);
    let changes = diff(&EncodedLists::from_triples(&authoritative), &current);
    tracing::debug!(
        sheet = %spec.name,
        group = %spec.group,
        store_triples = authoritative.len(),
        sheet_triples = current.triples.len(),
        "diffed sheet"
    );
    if changes.is_empty() {
        let status = SheetStatus::Unchanged {
            names: current.names.len(),
            triples: current.triples.len(),
        };
        return Ok((status, None));
    }
    let mut out = sheet.clone();
    write_lists(&mut out, cols, config.start_row, spec.flex, &authoritative)?;
    Ok((SheetStatus::Changed(changes), Some(out)))
}

/// Diff every configured sheet of `input` against `store`.
///
/// A missing header or store failure marks that sheet failed; the other
/// sheets are still processed.
pub fn sync_group_options(
    input: &Book,
    store: &dyn InventoryStore,
    config: &GroupOptionsConfig,
) -> ReconResult<SyncOutput> {
    let mut book = Book::new();
    let mut report = SyncReport::default();
    let mut seen = IndexSet::new();

    for spec in &config.sheets {
        if !seen.insert(spec.name.as_str()) {
            continue;
        }
        let Ok(sheet) = input.get_sheet(&spec.name) else {
            tracing::warn!(sheet = %spec.name, "sheet missing from input workbook");
            report
                .sheets
                .insert(spec.name.clone(), SheetStatus::MissingInInput);
            continue;
        };

        let status = match sync_sheet(sheet, spec, store, config) {
            Ok((status, updated)) => {
                if let (SheetStatus::Changed(changes), Some(updated)) = (&status, updated) {
                    tracing::info!(
                        sheet = %spec.name,
                        names_added = changes.names_added.len(),
                        names_removed = changes.names_removed.len(),
                        triples_added = changes.triples_added.len(),
                        triples_removed = changes.triples_removed.len(),
                        "sheet changed"
                    );
                    book.add_sheet(&spec.name, updated)?;
                }
                status
            }
            Err(err) => {
                tracing::warn!(sheet = %spec.name, error = %err, "sheet failed");
                SheetStatus::Failed(err.to_string())
            }
        };
        report.sheets.insert(spec.name.clone(), status);
    }

    if book.is_empty() {
        let mut placeholder = Sheet::with_name(NO_CHANGES_SHEET);
        placeholder.set_cell(1, 1, NO_CHANGES_TEXT)?;
        book.add_sheet(NO_CHANGES_SHEET, placeholder)?;
    }
    tracing::info!(changed = report.changed_count(), "group options sync finished");
    Ok(SyncOutput { book, report })
}
