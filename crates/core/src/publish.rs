//! Lead-time publishing into quote template workbooks.
//!
//! Each template tab is named after an inventory code. Its anchor row is the
//! first `FALSE` in the "Do Not Show?" column below the header row; the
//! lead-time text goes into the insertion column of that row.

use crate::config::LeadTimesConfig;
use crate::duration::display_ddmmyy;
use crate::error::{preview, ReconError, ReconResult};
use crate::html::{build_lines, render_fragment};
use crate::merge::{import_and_merge, CutoffColumnMap, CutoffRow, LeadColumnMap, StoreImport, StoreRows};
use crate::rewrite::{
    append_text, apply_detailed_banner, apply_summary_banner, has_lead_label, has_ready_in,
    literalize_newlines, rewrite_labeled, rewrite_summary, strip_banners,
};
use crate::source::RangeSource;
use blindsops_sheet::a1_notation::column_letters_to_index;
use blindsops_sheet::{Book, CellValue, Sheet};
use indexmap::{IndexMap, IndexSet};

/// Placeholder in the Detailed prefix template.
pub const LEAD_PLACEHOLDER: &str = "{LEAD}";

/// The two template layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Multi-line cells with a `Lead Time:` line.
    Detailed,
    /// One-line cells reading "Ready in ...".
    Summary,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Detailed => write!(f, "Detailed"),
            TemplateKind::Summary => write!(f, "Summary"),
        }
    }
}

/// Where the anchor and the target cell live. Columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorLayout {
    pub anchor_col: usize,
    pub header_row: usize,
    pub target_col: usize,
}

impl AnchorLayout {
    /// Layout for one template kind, from column letters in the config.
    pub fn from_config(config: &LeadTimesConfig, kind: TemplateKind) -> ReconResult<Self> {
        let letters = match kind {
            TemplateKind::Detailed => &config.insertion.detailed,
            TemplateKind::Summary => &config.insertion.summary,
        };
        let to_col = |l: &str| {
            column_letters_to_index(l)
                .map(|c| c + 1)
                .map_err(|_| ReconError::Config(format!("invalid column letter {l:?}")))
        };
        Ok(Self {
            anchor_col: to_col(&config.anchor_column)?,
            header_row: config.anchor_header_row,
            target_col: to_col(letters)?,
        })
    }
}

/// First row below `header_row` whose `col` holds `FALSE`, as a boolean or text.
#[must_use]
pub fn find_anchor_row(sheet: &Sheet, col: usize, header_row: usize) -> Option<usize> {
    (header_row + 1..=sheet.max_row()).find(|&row| match sheet.cell(row, col) {
        CellValue::Bool(b) => !b,
        CellValue::String(s) => s.trim().eq_ignore_ascii_case("false"),
        _ => false,
    })
}

fn first_nonblank_row(sheet: &Sheet, col: usize, header_row: usize) -> Option<usize> {
    (header_row + 1..=sheet.max_row()).find(|&row| !sheet.cell(row, col).is_blank())
}

/// Keep only tabs named after a control code (trimmed, case-insensitive).
///
/// An empty control list, or one matching no tab, leaves the book alone so
/// a workbook is never emptied. The diff between codes and tabs is reported.
pub fn prune_tabs(book: &mut Book, control_codes: &[String], warnings: &mut Vec<String>) {
    let wanted: IndexSet<String> = control_codes
        .iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    if wanted.is_empty() {
        warnings.push("[PRUNE] Control list is empty; skipping prune.".to_string());
        return;
    }

    let tabs: IndexSet<String> = book
        .sheet_names()
        .iter()
        .map(|n| n.trim().to_uppercase())
        .collect();
    let mut codes_without_tabs: Vec<String> = wanted.difference(&tabs).cloned().collect();
    let mut tabs_not_in_codes: Vec<String> = tabs.difference(&wanted).cloned().collect();
    codes_without_tabs.sort();
    tabs_not_in_codes.sort();
    warnings.push(format!(
        "[PRUNE] control_codes={}, workbook_tabs={}; codes-without-tabs: {}; tabs-not-in-codes: {}",
        wanted.len(),
        tabs.len(),
        preview(&codes_without_tabs),
        preview(&tabs_not_in_codes),
    ));

    if wanted.intersection(&tabs).next().is_none() {
        warnings.push("[PRUNE] No tabs match control list; nothing deleted.".to_string());
        return;
    }
    book.retain_sheets(|name, _| wanted.contains(&name.trim().to_uppercase()));
}

/// Options for one injection run.
#[derive(Debug, Clone, Copy)]
pub struct InjectOptions<'a> {
    pub store: &'a str,
    pub kind: TemplateKind,
    pub layout: AnchorLayout,
    /// Detailed only: prefix for cells without a `Lead Time:` label.
    pub detailed_prefix_template: Option<&'a str>,
}

/// What an injection run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectReport {
    pub warnings: Vec<String>,
    /// Tabs whose target cell was written.
    pub touched: Vec<String>,
}

fn detailed_text(existing: &str, lead: &str, cutoff: &str, prefix: Option<&str>) -> String {
    let body = literalize_newlines(&strip_banners(existing));
    let body = if has_lead_label(&body) {
        rewrite_labeled(&body, lead)
    } else if let Some(template) = prefix {
        format!("{}{body}", literalize_newlines(&template.replace(LEAD_PLACEHOLDER, lead)))
    } else {
        append_text(&body, lead)
    };
    apply_detailed_banner(&body, cutoff)
}

fn summary_text(existing: &str, lead: &str, cutoff: &str) -> String {
    let body = strip_banners(existing);
    let body = if has_ready_in(&body) {
        rewrite_summary(&body, lead)
    } else {
        append_text(&body, lead)
    };
    apply_summary_banner(&body, cutoff)
}

/// Prune `book` to the store's codes and write each tab's lead time.
pub fn inject(
    book: &mut Book,
    import: &StoreImport,
    cutoffs: &IndexMap<String, CutoffRow>,
    options: &InjectOptions<'_>,
) -> ReconResult<InjectReport> {
    let mut report = InjectReport::default();
    prune_tabs(book, &import.control_codes, &mut report.warnings);
    let store = options.store;
    let kind = options.kind;
    let layout = options.layout;

    for (name, sheet) in book.sheets_mut() {
        let code = name.trim().to_uppercase();
        let Some(lead) = import.leads.get(&code) else {
            report
                .warnings
                .push(format!("[{store}/{code}] No lead-time text found; skipped."));
            continue;
        };
        let Some(anchor) = find_anchor_row(sheet, layout.anchor_col, layout.header_row) else {
            report.warnings.push(format!(
                "[{store}/{code}] {kind}: no FALSE below row {} in the anchor column; skipped.",
                layout.header_row
            ));
            continue;
        };
        if kind == TemplateKind::Summary {
            if let Some(first) = first_nonblank_row(sheet, layout.target_col, layout.header_row) {
                if first != anchor {
                    report.warnings.push(format!(
                        "[{store}/{code}] Summary: anchor row {anchor} != first non-blank row {first}; wrote at anchor."
                    ));
                }
            }
        }

        let cutoff = cutoffs
            .get(&code)
            .map(|c| display_ddmmyy(c.cutoff_date))
            .unwrap_or_default();
        let existing = sheet.cell(anchor, layout.target_col).to_normalized_string();
        let updated = match kind {
            TemplateKind::Detailed => detailed_text(
                &existing,
                &lead.lead_text,
                &cutoff,
                options.detailed_prefix_template,
            ),
            TemplateKind::Summary => summary_text(&existing, &lead.lead_text, &cutoff),
        };
        sheet.set_cell(anchor, layout.target_col, updated)?;
        report.touched.push(name.to_string());
    }

    tracing::info!(
        store,
        kind = %kind,
        touched = report.touched.len(),
        warnings = report.warnings.len(),
        "injected lead times"
    );
    Ok(report)
}

/// Drop output tabs whose target cell still equals the template's.
///
/// The target row is the output tab's anchor row. Tabs without an anchor
/// or without a template counterpart are kept, and so is the whole book if
/// every tab is unchanged. Returns the dropped tab names.
pub fn prune_unchanged(
    template: &Book,
    output: &mut Book,
    layout: AnchorLayout,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    let unchanged: Vec<String> = output
        .sheets()
        .filter(|(name, sheet)| {
            let Ok(original) = template.get_sheet(name) else {
                return false;
            };
            let Some(row) = find_anchor_row(sheet, layout.anchor_col, layout.header_row) else {
                return false;
            };
            sheet.cell(row, layout.target_col).to_normalized_string()
                == original.cell(row, layout.target_col).to_normalized_string()
        })
        .map(|(name, _)| name.to_string())
        .collect();

    if unchanged.is_empty() {
        return unchanged;
    }
    if unchanged.len() == output.sheet_count() {
        warnings.push("[PRUNE] Every tab is unchanged; keeping all.".to_string());
        return Vec::new();
    }
    output.retain_sheets(|name, _| !unchanged.iter().any(|u| u == name));
    unchanged
}

/// Template workbooks to publish into.
#[derive(Debug, Clone, Copy, Default)]
pub struct Templates<'a> {
    pub detailed: Option<&'a Book>,
    pub summary: Option<&'a Book>,
}

/// Everything produced for one store.
#[derive(Debug, Clone)]
pub struct StorePublication {
    pub html: String,
    pub detailed: Option<Book>,
    pub summary: Option<Book>,
    pub warnings: Vec<String>,
}

/// Per-store publications in config order.
#[derive(Debug)]
pub struct PublishOutcome {
    pub stores: IndexMap<String, ReconResult<StorePublication>>,
}

fn publish_into(
    template: &Book,
    import: &StoreImport,
    cutoffs: &IndexMap<String, CutoffRow>,
    options: &InjectOptions<'_>,
    warnings: &mut Vec<String>,
) -> ReconResult<Book> {
    let mut book = template.clone();
    let report = inject(&mut book, import, cutoffs, options)?;
    warnings.extend(report.warnings);
    let pruned = prune_unchanged(template, &mut book, options.layout, warnings);
    if !pruned.is_empty() {
        warnings.push(format!(
            "[{}] {}: dropped unchanged tabs: {}",
            options.store,
            options.kind,
            preview(&pruned)
        ));
    }
    Ok(book)
}

/// Fetch every configured tab, merge, and publish each store that validates.
///
/// Fetch failures abort the run; a store failing validation only loses its
/// own output.
///
/// Output workbooks carry cell values only. Template styles, column widths
/// and VBA projects are not copied, so an `.xlsm` template comes back as a
/// plain workbook once saved.
pub fn publish_lead_times(
    source: &dyn RangeSource,
    config: &LeadTimesConfig,
    templates: Templates<'_>,
) -> ReconResult<PublishOutcome> {
    let lead_cols = LeadColumnMap::from_letters(&config.lead_columns)?;
    let cutoff_cols = CutoffColumnMap::from_letters(&config.cutoff_columns)?;
    let detailed_layout = AnchorLayout::from_config(config, TemplateKind::Detailed)?;
    let summary_layout = AnchorLayout::from_config(config, TemplateKind::Summary)?;

    let mut store_rows = Vec::with_capacity(config.stores.len());
    for store in &config.stores {
        let range = store.source.range(&config.fetch_columns);
        let rows = source.fetch_range(&store.source.sheet_id, &range)?;
        tracing::debug!(store = %store.name, rows = rows.len(), "fetched lead rows");
        store_rows.push(StoreRows {
            store: store.name.clone(),
            rows,
        });
    }
    let cutoff_range = config.cutoff.range(&config.fetch_columns);
    let cutoff_rows = source.fetch_range(&config.cutoff.sheet_id, &cutoff_range)?;

    let merged = import_and_merge(&store_rows, &cutoff_rows, lead_cols, cutoff_cols);
    let cutoffs = &merged.cutoffs;

    let mut stores = IndexMap::new();
    for (store, result) in merged.stores {
        let publication = result.and_then(|import| {
            let mut warnings = vec![format!(
                "[CONTROL] {store} codes={} (e.g., {})",
                import.control_codes.len(),
                preview(&import.control_codes)
            )];
            let html = render_fragment(&build_lines(&import.products, cutoffs, &config.placeholder));

            let detailed = templates
                .detailed
                .map(|template| {
                    let options = InjectOptions {
                        store: &store,
                        kind: TemplateKind::Detailed,
                        layout: detailed_layout,
                        detailed_prefix_template: config.detailed_prefix_template.as_deref(),
                    };
                    publish_into(template, &import, cutoffs, &options, &mut warnings)
                })
                .transpose()?;
            let summary = templates
                .summary
                .map(|template| {
                    let options = InjectOptions {
                        store: &store,
                        kind: TemplateKind::Summary,
                        layout: summary_layout,
                        detailed_prefix_template: None,
                    };
                    publish_into(template, &import, cutoffs, &options, &mut warnings)
                })
                .transpose()?;

            Ok(StorePublication {
                html,
                detailed,
                summary,
                warnings,
            })
        });
        stores.insert(store, publication);
    }
    Ok(PublishOutcome { stores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::LeadRow;
    use chrono::NaiveDate;

    fn layout(target_col: usize) -> AnchorLayout {
        AnchorLayout {
            anchor_col: 6,
            header_row: 2,
            target_col,
        }
    }

    fn tab(target_col: usize, text: &str, anchor: CellValue) -> Sheet {
        let mut sheet = Sheet::new();
        sheet.set_cell(2, 6, "Do Not Show?").unwrap();
        sheet.set_cell(3, target_col, text).unwrap();
        sheet.set_cell(3, 6, anchor).unwrap();
        sheet
    }

    fn import(entries: &[(&str, &str)]) -> StoreImport {
        let leads: IndexMap<String, LeadRow> = entries
            .iter()
            .map(|(code, lead)| {
                (
                    (*code).to_string(),
                    LeadRow {
                        product: format!("Product {code}"),
                        codes: vec![(*code).to_string()],
                        lead_text: (*lead).to_string(),
                        upper_bound_weeks: 0.0,
                    },
                )
            })
            .collect();
        StoreImport {
            control_codes: leads.keys().cloned().collect(),
            products: Vec::new(),
            leads,
        }
    }

    fn cutoffs(code: &str) -> IndexMap<String, CutoffRow> {
        [(
            code.to_string(),
            CutoffRow {
                product: "x".to_string(),
                codes: vec![code.to_string()],
                cutoff_date: NaiveDate::from_ymd_opt(2025, 11, 6).unwrap(),
            },
        )]
        .into_iter()
        .collect()
    }

    fn options(kind: TemplateKind, target_col: usize) -> InjectOptions<'static> {
        InjectOptions {
            store: "CANBERRA",
            kind,
            layout: layout(target_col),
            detailed_prefix_template: None,
        }
    }

    #[test]
    fn test_anchor_accepts_bool_and_text() {
        assert_eq!(find_anchor_row(&tab(2, "x", CellValue::Bool(false)), 6, 2), Some(3));
        assert_eq!(find_anchor_row(&tab(2, "x", CellValue::from(" false ")), 6, 2), Some(3));
        assert_eq!(find_anchor_row(&tab(2, "x", CellValue::Bool(true)), 6, 2), None);
        assert_eq!(find_anchor_row(&tab(2, "x", CellValue::from("FALSE")), 6, 3), None);
    }

    #[test]
    fn test_detailed_rewrites_label_and_adds_banner() {
        let mut book = Book::new();
        book.add_sheet(
            "ABC",
            tab(
                2,
                "\n       -       Lead Time:  4 - 5 Weeks\n       -       Location:  Canberra",
                CellValue::Bool(false),
            ),
        )
        .unwrap();
        let report = inject(
            &mut book,
            &import(&[("ABC", "6–8 Weeks")]),
            &cutoffs("ABC"),
            &options(TemplateKind::Detailed, 2),
        )
        .unwrap();
        assert_eq!(report.touched, vec!["ABC".to_string()]);
        let value = book.get_sheet("ABC").unwrap().cell(3, 2).to_normalized_string();
        assert_eq!(
            value,
            "\\n***CHRISTMAS CUTOFF 06/11/25 ***-       Lead Time:  6–8 Weeks\\n       -       Location:  Canberra"
        );
    }

    #[test]
    fn test_detailed_prefix_template_without_label() {
        let mut book = Book::new();
        book.add_sheet("DEF", tab(2, "Some other detail text", CellValue::Bool(false)))
            .unwrap();
        let opts = InjectOptions {
            detailed_prefix_template: Some("\n       -       Lead Time: {LEAD} \n       -       "),
            ..options(TemplateKind::Detailed, 2)
        };
        inject(&mut book, &import(&[("DEF", "3–4 Weeks")]), &IndexMap::new(), &opts).unwrap();
        let value = book.get_sheet("DEF").unwrap().cell(3, 2).to_normalized_string();
        assert!(value.starts_with("\\n       -       Lead Time: 3–4 Weeks \\n       -       "));
        assert!(value.ends_with("Some other detail text"));
    }

    #[test]
    fn test_summary_keeps_brackets_and_appends_banner() {
        let mut book = Book::new();
        book.add_sheet(
            "GHI",
            tab(
                3,
                "Ready in 2 - 3 Weeks (PC Hardware 4-5 Weeks, Others 6 weeks), manufactured locally",
                CellValue::Bool(false),
            ),
        )
        .unwrap();
        let report = inject(
            &mut book,
            &import(&[("GHI", "6–8 Weeks")]),
            &cutoffs("GHI"),
            &options(TemplateKind::Summary, 3),
        )
        .unwrap();
        assert_eq!(report.touched.len(), 1);
        let value = book.get_sheet("GHI").unwrap().cell(3, 3).to_normalized_string();
        assert_eq!(
            value,
            "Ready in 6–8 Weeks (PC Hardware 4-5 Weeks, Others 6 weeks), manufactured locally ***CHRISTMAS CUTOFF 06/11/25 ***"
        );
    }

    #[test]
    fn test_summary_warns_on_row_mismatch() {
        let mut sheet = tab(3, "", CellValue::Bool(true));
        sheet.set_cell(3, 3, "Header-ish note").unwrap();
        sheet.set_cell(4, 6, false).unwrap();
        let mut book = Book::new();
        book.add_sheet("JKL", sheet).unwrap();
        let report = inject(
            &mut book,
            &import(&[("JKL", "4 weeks")]),
            &IndexMap::new(),
            &options(TemplateKind::Summary, 3),
        )
        .unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("anchor row 4")));
        assert_eq!(book.get_sheet("JKL").unwrap().cell(4, 3), &CellValue::from("4 weeks"));
    }

    #[test]
    fn test_prune_and_skips() {
        let mut book = Book::new();
        book.add_sheet("abc", tab(2, "x", CellValue::Bool(false))).unwrap();
        book.add_sheet("NOANCHOR", tab(2, "x", CellValue::Bool(true))).unwrap();
        book.add_sheet("Instructions", Sheet::new()).unwrap();
        let report = inject(
            &mut book,
            &import(&[("ABC", "2 weeks"), ("NOANCHOR", "3 weeks"), ("MISSING", "1 week")]),
            &IndexMap::new(),
            &options(TemplateKind::Detailed, 2),
        )
        .unwrap();
        assert_eq!(book.sheet_names(), vec!["abc", "NOANCHOR"]);
        assert_eq!(report.touched, vec!["abc".to_string()]);
        assert!(report.warnings[0].contains("codes-without-tabs: MISSING"));
        assert!(report.warnings[0].contains("tabs-not-in-codes: INSTRUCTIONS"));
        assert!(report.warnings.iter().any(|w| w.contains("[CANBERRA/NOANCHOR]")));
    }

    #[test]
    fn test_prune_never_empties_book() {
        let mut book = Book::new();
        book.add_sheet("Instructions", Sheet::new()).unwrap();
        let mut warnings = Vec::new();
        prune_tabs(&mut book, &["ABC".to_string()], &mut warnings);
        assert_eq!(book.sheet_count(), 1);
        assert!(warnings.iter().any(|w| w.contains("nothing deleted")));

        prune_tabs(&mut book, &[], &mut warnings);
        assert_eq!(book.sheet_count(), 1);
    }

    #[test]
    fn test_prune_unchanged_tabs() {
        let mut template = Book::new();
        template.add_sheet("SAME", tab(2, "X", CellValue::Bool(false))).unwrap();
        template.add_sheet("DIFF", tab(2, "Old", CellValue::Bool(false))).unwrap();
        let mut output = Book::new();
        output.add_sheet("SAME", tab(2, "X", CellValue::Bool(false))).unwrap();
        output.add_sheet("DIFF", tab(2, "New", CellValue::Bool(false))).unwrap();

        let mut warnings = Vec::new();
        let pruned = prune_unchanged(&template, &mut output, layout(2), &mut warnings);
        assert_eq!(pruned, vec!["SAME".to_string()]);
        assert_eq!(output.sheet_names(), vec!["DIFF"]);

        let pruned = prune_unchanged(&output.clone(), &mut output, layout(2), &mut warnings);
        assert!(pruned.is_empty());
        assert_eq!(output.sheet_count(), 1);
    }
}
