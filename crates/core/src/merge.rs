//! Per-code merge of lead-time and cutoff tabs, with code-set validation.
//!
//! Every store has its own lead-time tab; one cutoff tab is shared. Rows map
//! a product to a comma-separated list of inventory codes. Rows are folded
//! per code, conservatively: the longest lead time and the earliest cutoff
//! win. A store whose lead codes differ from the cutoff codes gets no
//! output at all.

use crate::config::{CutoffColumns, LeadColumns};
use crate::duration::{parse_au_date, parse_upper_bound_weeks};
use crate::error::{ReconError, ReconResult};
use blindsops_sheet::a1_notation::column_letters_to_index;
use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;

/// One lead-time row as read from a store tab.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRow {
    pub product: String,
    pub codes: Vec<String>,
    pub lead_text: String,
    pub upper_bound_weeks: f64,
}

/// One cutoff row as read from the cutoff tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoffRow {
    pub product: String,
    pub codes: Vec<String>,
    pub cutoff_date: NaiveDate,
}

/// A product line for the customer-facing summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLine {
    pub product: String,
    pub lead_text: String,
    pub codes: Vec<String>,
}

fn column(letters: &str, role: &str) -> ReconResult<usize> {
    column_letters_to_index(letters)
        .map_err(|_| ReconError::Config(format!("invalid column letter {letters:?} for {role}")))
}

/// 0-based columns of a lead-time tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadColumnMap {
    pub product: usize,
    pub mapping: usize,
    pub lead_time: usize,
}

impl LeadColumnMap {
    pub fn from_letters(cols: &LeadColumns) -> ReconResult<Self> {
        Ok(Self {
            product: column(&cols.product, "product")?,
            mapping: column(&cols.mapping, "mapping")?,
            lead_time: column(&cols.lead_time, "lead_time")?,
        })
    }
}

/// 0-based columns of the cutoff tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffColumnMap {
    pub product: usize,
    pub mapping: usize,
    pub cutoff_date: usize,
}

impl CutoffColumnMap {
    pub fn from_letters(cols: &CutoffColumns) -> ReconResult<Self> {
        Ok(Self {
            product: column(&cols.product, "product")?,
            mapping: column(&cols.mapping, "mapping")?,
            cutoff_date: column(&cols.cutoff_date, "cutoff_date")?,
        })
    }
}

/// Split a mapping cell into trimmed, upper-cased, non-empty codes.
#[must_use]
pub fn split_codes(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}

fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", |s| s.trim())
}

fn looks_like_header(product: &str, mapping: &str) -> bool {
    product.eq_ignore_ascii_case("product") || mapping.to_lowercase().contains("inventory code")
}

/// Fold lead rows per code; the larger upper bound wins and a tie goes to
/// the later row.
#[must_use]
pub fn fold_leads(rows: &[Vec<String>], cols: LeadColumnMap) -> IndexMap<String, LeadRow> {
    let mut per_code: IndexMap<String, LeadRow> = IndexMap::new();
    for row in rows {
        let product = field(row, cols.product);
        let mapping = field(row, cols.mapping);
        let lead_text = field(row, cols.lead_time);
        if product.is_empty() && mapping.is_empty() && lead_text.is_empty() {
            continue;
        }
        if looks_like_header(product, mapping) || lead_text.to_lowercase().starts_with("lead") {
            continue;
        }
        let codes = split_codes(mapping);
        if product.is_empty() || codes.is_empty() || lead_text.is_empty() {
            continue;
        }

        let candidate = LeadRow {
            product: product.to_string(),
            codes: codes.clone(),
            lead_text: lead_text.to_string(),
            upper_bound_weeks: parse_upper_bound_weeks(lead_text),
        };
        for code in codes {
            match per_code.get(&code) {
                Some(existing) if candidate.upper_bound_weeks < existing.upper_bound_weeks => {}
                _ => {
                    per_code.insert(code, candidate.clone());
                }
            }
        }
    }
    per_code
}

/// Fold cutoff rows per code; the earlier date wins. Rows with an
/// unreadable date are skipped.
#[must_use]
pub fn fold_cutoffs(rows: &[Vec<String>], cols: CutoffColumnMap) -> IndexMap<String, CutoffRow> {
    let mut per_code: IndexMap<String, CutoffRow> = IndexMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let product = field(row, cols.product);
        let mapping = field(row, cols.mapping);
        let raw_date = field(row, cols.cutoff_date);
        if looks_like_header(product, mapping) {
            continue;
        }
        let codes = split_codes(mapping);
        if product.is_empty() || codes.is_empty() || raw_date.is_empty() {
            continue;
        }
        let cutoff_date = match parse_au_date(raw_date) {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(row = idx + 1, product, error = %err, "skipping cutoff row");
                continue;
            }
        };

        let candidate = CutoffRow {
            product: product.to_string(),
            codes: codes.clone(),
            cutoff_date,
        };
        for code in codes {
            match per_code.get(&code) {
                Some(existing) if existing.cutoff_date <= cutoff_date => {}
                _ => {
                    per_code.insert(code, candidate.clone());
                }
            }
        }
    }
    per_code
}

/// Require the store's lead codes to equal the cutoff codes.
pub fn validate(
    store: &str,
    leads: &IndexMap<String, LeadRow>,
    cutoffs: &IndexMap<String, CutoffRow>,
) -> ReconResult<()> {
    let lead_codes: BTreeSet<&String> = leads.keys().collect();
    let cutoff_codes: BTreeSet<&String> = cutoffs.keys().collect();
    if lead_codes == cutoff_codes {
        return Ok(());
    }
    Err(ReconError::CodeSetMismatch {
        store: store.to_string(),
        missing_in_cutoff: lead_codes
            .difference(&cutoff_codes)
            .map(|c| (*c).clone())
            .collect(),
        extra_in_cutoff: cutoff_codes
            .difference(&lead_codes)
            .map(|c| (*c).clone())
            .collect(),
    })
}

/// One line per distinct product, sorted by upper-cased product name; the
/// first record seen for a product wins.
#[must_use]
pub fn product_list(leads: &IndexMap<String, LeadRow>) -> Vec<ProductLine> {
    let mut records: Vec<&LeadRow> = leads.values().collect();
    records.sort_by_cached_key(|r| r.product.to_uppercase());

    let mut seen = IndexSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.product.as_str()))
        .map(|r| ProductLine {
            product: r.product.clone(),
            lead_text: r.lead_text.clone(),
            codes: r.codes.clone(),
        })
        .collect()
}

/// Merged data for one store that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreImport {
    pub leads: IndexMap<String, LeadRow>,
    pub products: Vec<ProductLine>,
    /// Codes the store publishes, sorted; one template tab each.
    pub control_codes: Vec<String>,
}

/// Result of one merge run.
#[derive(Debug)]
pub struct MergeOutcome {
    pub cutoffs: IndexMap<String, CutoffRow>,
    /// Per store, in input order. A failed store has no data.
    pub stores: IndexMap<String, ReconResult<StoreImport>>,
}

/// Raw lead rows of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRows {
    pub store: String,
    pub rows: Vec<Vec<String>>,
}

/// Fold every store's lead rows and the shared cutoff rows, then validate
/// each store independently.
#[must_use]
pub fn import_and_merge(
    stores: &[StoreRows],
    cutoff_rows: &[Vec<String>],
    lead_cols: LeadColumnMap,
    cutoff_cols: CutoffColumnMap,
) -> MergeOutcome {
    let cutoffs = fold_cutoffs(cutoff_rows, cutoff_cols);
    tracing::debug!(codes = cutoffs.len(), "folded cutoff rows");

    let mut results = IndexMap::new();
    for StoreRows { store, rows } in stores {
        let leads = fold_leads(rows, lead_cols);
        let result = validate(store, &leads, &cutoffs).map(|()| {
            let mut control_codes: Vec<String> = leads.keys().cloned().collect();
            control_codes.sort();
            StoreImport {
                products: product_list(&leads),
                leads,
                control_codes,
            }
        });
        match &result {
            Ok(import) => tracing::info!(
                store = %store,
                codes = import.control_codes.len(),
                products = import.products.len(),
                "store merged"
            ),
            Err(err) => tracing::warn!(store = %store, error = %err, "store failed validation"),
        }
        results.insert(store.clone(), result);
    }

    MergeOutcome {
        cutoffs,
        stores: results,
    }
}
