//! Error types for blindsops.

use blindsops_sheet::SheetError;
use thiserror::Error;

/// Result type for reconciliation operations.
pub type ReconResult<T> = Result<T, ReconError>;

/// Errors that can occur while reconciling sheets.
///
/// Structural and validation errors are scoped to one unit of work (a sheet
/// or a store); callers record them and carry on with the remaining units.
#[derive(Debug, Error)]
pub enum ReconError {
    /// A required header was not found in a sheet's header row.
    #[error("{sheet}: missing {} header(s)", missing.join(" / "))]
    MissingHeaders { sheet: String, missing: Vec<String> },

    /// Lead and cutoff sources disagree on the set of inventory codes.
    #[error(
        "Validation failed for {store}: code sets differ (missing in cutoffs: {}; extra in cutoffs: {})",
        preview(missing_in_cutoff),
        preview(extra_in_cutoff)
    )]
    CodeSetMismatch {
        store: String,
        missing_in_cutoff: Vec<String>,
        extra_in_cutoff: Vec<String>,
    },

    /// A date cell could not be understood.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A range specification such as `Tab!A:Z` could not be parsed.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A tabular source id or tab was not available.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sheet model or workbook I/O error.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// Relational store error.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// YAML configuration parse error.
    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render a code list for diagnostics, capped at a dozen entries.
pub(crate) fn preview(items: &[String]) -> String {
    const LIMIT: usize = 12;
    if items.is_empty() {
        return "none".to_string();
    }
    if items.len() > LIMIT {
        format!("{}, +{} more", items[..LIMIT].join(", "), items.len() - LIMIT)
    } else {
        items.join(", ")
    }
}
