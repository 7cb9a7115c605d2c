//! Context-preserving rewrites of free-form lead-time text.
//!
//! Cells in the quote templates mix a lead-time value with hand-written
//! notes. Each rewrite locates the value span and swaps only that; every
//! other byte of the cell comes back unchanged. Both real newlines and the
//! two-character `\n` token (which the templates store literally) end a line.

use regex::Regex;

fn lead_label_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)lead\s*time\s*:\s*").expect("valid regex"))
}

fn ready_in_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bready\s*in\b").expect("valid regex"))
}

fn banner_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\\n)?\*\*\*CHRISTMAS CUTOFF[^*]*\*\*\*").expect("valid regex")
    })
}

/// The literal newline token used inside template cells.
pub const LITERAL_NEWLINE: &str = "\\n";

/// Byte offset of the first line boundary at or after `start`.
fn find_eol(text: &str, start: usize) -> Option<usize> {
    let rest = &text[start..];
    [
        rest.find(LITERAL_NEWLINE),
        rest.find('\n'),
        rest.find('\r'),
    ]
    .into_iter()
    .flatten()
    .min()
    .map(|i| start + i)
}

/// Replace the value after a `Lead Time:` label, up to the end of its line.
///
/// Text without the label is returned unchanged.
#[must_use]
pub fn rewrite_labeled(text: &str, new_value: &str) -> String {
    let Some(label) = lead_label_regex().find(text) else {
        return text.to_string();
    };
    let value_start = label.end();
    let value_end = find_eol(text, value_start).unwrap_or(text.len());
    format!("{}{}{}", &text[..value_start], new_value, &text[value_end..])
}

/// True when `text` carries a `Lead Time:` label.
#[must_use]
pub fn has_lead_label(text: &str) -> bool {
    lead_label_regex().is_match(text)
}

/// True when `text` carries a "ready in" phrase.
#[must_use]
pub fn has_ready_in(text: &str) -> bool {
    ready_in_regex().is_match(text)
}

/// Replace the value after "ready in".
///
/// The value starts at the first non-space after the phrase and ends at the
/// first `(`, `,` or line boundary, less any trailing whitespace. A bracket
/// group closing the value therefore survives verbatim together with
/// whatever follows it, nested brackets and commas included. Text without
/// the phrase is returned unchanged.
#[must_use]
pub fn rewrite_summary(text: &str, new_value: &str) -> String {
    let Some(phrase) = ready_in_regex().find(text) else {
        return text.to_string();
    };
    let value_start = text[phrase.end()..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(text.len(), |(i, _)| phrase.end() + i);

    let boundary = text[value_start..]
        .char_indices()
        .find(|&(i, ch)| {
            matches!(ch, '(' | ',' | '\n' | '\r')
                || text[value_start + i..].starts_with(LITERAL_NEWLINE)
        })
        .map_or(text.len(), |(i, _)| value_start + i);
    let value_end = value_start + text[value_start..boundary].trim_end().len();

    format!("{}{}{}", &text[..value_start], new_value, &text[value_end..])
}

/// The cutoff banner for a display date such as `06/11/25`.
#[must_use]
pub fn banner(cutoff: &str) -> String {
    format!("***CHRISTMAS CUTOFF {cutoff} ***")
}

/// Remove every cutoff banner (with a literal `\n` right before it) and trim.
#[must_use]
pub fn strip_banners(text: &str) -> String {
    banner_regex().replace_all(text, "").trim().to_string()
}

/// Put the banner on its own line in front of a Detailed body.
///
/// Existing banners are replaced, so applying twice is the same as once. An
/// empty cutoff only strips.
#[must_use]
pub fn apply_detailed_banner(body: &str, cutoff: &str) -> String {
    let stripped = strip_banners(body);
    if cutoff.trim().is_empty() {
        return stripped;
    }
    format!("{LITERAL_NEWLINE}{}{stripped}", banner(cutoff.trim()))
}

/// Append the banner to a Summary line after a single space.
#[must_use]
pub fn apply_summary_banner(body: &str, cutoff: &str) -> String {
    let stripped = strip_banners(body);
    let stripped = stripped.trim_end();
    if cutoff.trim().is_empty() {
        return stripped.to_string();
    }
    if stripped.is_empty() {
        return banner(cutoff.trim());
    }
    format!("{stripped} {}", banner(cutoff.trim()))
}

/// Append `text` to a cell's existing text.
///
/// No separator is added when the existing text already ends in a space or
/// comma; blank existing text is replaced.
#[must_use]
pub fn append_text(existing: &str, text: &str) -> String {
    if existing.trim().is_empty() {
        return text.to_string();
    }
    let sep = if existing.ends_with(' ') || existing.ends_with(',') {
        ""
    } else {
        " "
    };
    format!("{existing}{sep}{text}")
}

/// Turn real line breaks into the literal `\n` token.
#[must_use]
pub fn literalize_newlines(text: &str) -> String {
    text.replace("\r\n", LITERAL_NEWLINE)
        .replace(['\n', '\r'], LITERAL_NEWLINE)
}
