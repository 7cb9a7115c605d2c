//! Text normalization shared by the scanner and the differ.

use indexmap::IndexSet;

/// Replace non-breaking spaces, collapse whitespace runs to one space and trim.
#[must_use]
pub fn norm_text(s: &str) -> String {
    s.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-fold a string unless the comparison is case-sensitive.
#[must_use]
pub fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}

/// A normalized, deduplicated list of search terms.
///
/// Insertion order is kept for display; matching does not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    terms: IndexSet<String>,
    case_sensitive: bool,
}

impl TermSet {
    /// Parse one term per line. Lines are trimmed and blank lines dropped,
    /// so an empty term can never reach the scanner.
    #[must_use]
    pub fn from_lines(raw: &str, case_sensitive: bool) -> Self {
        Self::from_terms(raw.lines(), case_sensitive)
    }

    /// Build from an iterator of raw terms.
    pub fn from_terms<I, S>(raw: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = raw
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| fold(&t, case_sensitive))
            .collect();
        Self {
            terms,
            case_sensitive,
        }
    }

    #[must_use]
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Terms contained in `haystack`, which must already be folded the same way.
    pub fn matches_in<'a>(&'a self, haystack: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |t| haystack.contains(*t))
    }
}
