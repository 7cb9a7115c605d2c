//! Pasteable HTML lead-time summaries.

use crate::duration::display_ddmmyy;
use crate::merge::{CutoffRow, ProductLine};
use indexmap::IndexMap;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Collapse whitespace and drop trailing colons, dashes and spaces.
fn tidy_product(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—'))
        .replace("::", ":")
}

/// `"<product>: <lead>"` per product, with the earliest cutoff among the
/// product's codes appended when there is one.
#[must_use]
pub fn build_lines(
    products: &[ProductLine],
    cutoffs: &IndexMap<String, CutoffRow>,
    placeholder: &str,
) -> Vec<String> {
    products
        .iter()
        .map(|item| {
            let lead = if item.lead_text.trim().is_empty() {
                placeholder
            } else {
                item.lead_text.trim()
            };
            let mut line = format!("{}: {}", tidy_product(&item.product), lead);
            let earliest = item
                .codes
                .iter()
                .filter_map(|code| cutoffs.get(code))
                .map(|c| c.cutoff_date)
                .min();
            if let Some(date) = earliest {
                line.push_str(&format!(" ***CHRISTMAS CUTOFF {}***", display_ddmmyy(date)));
            }
            line
        })
        .collect()
}

/// Wrap each escaped line in `<p>…<br /></p>`, one per output line.
#[must_use]
pub fn render_fragment(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("<p>{}<br /></p>", escape_html(line)))
        .collect::<Vec<_>>()
        .join("\n")
}
