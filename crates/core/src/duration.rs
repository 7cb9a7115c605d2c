//! Lead-time duration and cutoff date parsing.

use crate::error::{ReconError, ReconResult};
use chrono::NaiveDate;
use regex::{Captures, Match, Regex};

const UNIT: &str = r"w(?:eeks?)?|wk?s?|days?|business\s+days?";

fn range_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)(?P<a>\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(?P<b>\d+(?:\.\d+)?)\s*(?P<u>{UNIT})?"
        ))
        .expect("valid regex")
    })
}

fn unit_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)^(?:{UNIT})$")).expect("valid regex"))
}

fn single_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)(?P<n>\d+(?:\.\d+)?)\s*(?P<u>{UNIT})")).expect("valid regex")
    })
}

/// Convert to weeks. Units starting with `w` are already weeks; day counts
/// (plain or business) become `ceil(n / 5)`.
fn to_weeks(n: f64, unit: Option<&str>) -> f64 {
    match unit {
        Some(u) if !u.trim().to_lowercase().starts_with('w') => (n / 5.0).ceil(),
        _ => n,
    }
}

fn number(caps: &Captures<'_>, name: &str) -> Option<f64> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn preceded_by_digit(text: &str, start: usize) -> bool {
    text[..start].chars().next_back().is_some_and(|c| c.is_ascii_digit())
}

/// End of the longest spelling of `unit` that is not followed by a digit.
///
/// `3 weeks2` still reads as `3 week`; `6 w2` has no such spelling.
fn unit_end(text: &str, unit: Match<'_>) -> Option<usize> {
    (unit.start() + 1..=unit.end()).rev().find(|&end| {
        text.is_char_boundary(end)
            && !text[end..].starts_with(|c: char| c.is_ascii_digit())
            && unit_regex().is_match(&text[unit.start()..end])
    })
}

/// Worst-case lead time in weeks over every duration in `text`.
///
/// Ranges (`2-3 weeks`, `2 – 3`, `10 to 15 business days`) contribute their
/// larger bound; singles (`14 days`, `6 wks`) need a unit and must not sit
/// against another digit. Text without any duration gives `0.0`.
#[must_use]
pub fn parse_upper_bound_weeks(text: &str) -> f64 {
    let mut best = 0.0_f64;

    for caps in range_regex().captures_iter(text) {
        if let (Some(a), Some(b)) = (number(&caps, "a"), number(&caps, "b")) {
            let unit = caps.name("u").map(|m| m.as_str());
            best = best.max(to_weeks(a.max(b), unit));
        }
    }

    for caps in single_regex().captures_iter(text) {
        let (Some(whole), Some(unit)) = (caps.get(0), caps.name("u")) else {
            continue;
        };
        if preceded_by_digit(text, whole.start()) {
            continue;
        }
        let Some(end) = unit_end(text, unit) else {
            continue;
        };
        if let Some(n) = number(&caps, "n") {
            best = best.max(to_weeks(n, Some(&text[unit.start()..end])));
        }
    }

    best
}

/// Parse a cutoff date written as `YYYY-MM-DD`, `dd/mm/yy` or `dd/mm/yyyy`.
///
/// Two-digit years up to 69 are 20xx, the rest 19xx. A time part after an
/// ISO date is ignored.
pub fn parse_au_date(s: &str) -> ReconResult<NaiveDate> {
    let text = s.trim();
    let invalid = || ReconError::InvalidDate(s.to_string());
    if text.is_empty() {
        return Err(invalid());
    }

    if text.contains('-') && text.len() >= 8 {
        let date_part = text.split(['T', ' ']).next().unwrap_or(text);
        return NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid());
    }

    let parts: Vec<&str> = text.split('/').map(str::trim).collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(invalid());
    };
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let mut year: i32 = year.parse().map_err(|_| invalid())?;
    if parts[2].len() == 2 {
        year += if year <= 69 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Format a date as `dd/mm/yy`.
#[must_use]
pub fn display_ddmmyy(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}
