//! # blindsops-core
//!
//! Reconciliation engine for the blinds operations workbooks.
//!
//! This crate provides:
//! - Term filtering of workbooks with row pruning
//! - Group-options list sync against the inventory store
//! - Lead-time merge, HTML rendering and template publishing
//! - Configuration and error types

/// Row-range compaction.
pub mod compact;
/// YAML configuration.
pub mod config;
/// Group-options differ and sync pass.
pub mod differ;
/// Lead-time durations and cutoff dates.
pub mod duration;
/// Error types and result aliases.
pub mod error;
/// Workbook filter pass.
pub mod filter;
/// HTML lead-time fragment.
pub mod html;
/// Lead-time and cutoff merge.
pub mod merge;
/// Template injection and pruning.
pub mod publish;
/// Context-preserving text rewrites.
pub mod rewrite;
/// Term/row scanner.
pub mod scan;
/// Tabular range sources.
pub mod source;
/// Inventory store access.
pub mod store;
/// Text normalization and term lists.
pub mod text;

/// Re-export configuration types.
pub use config::{FilterConfig, GroupOptionsConfig, LeadTimesConfig, ReconConfig};
/// Re-export core error types.
pub use error::{ReconError, ReconResult};
/// Re-export the pass entry points.
pub use differ::{sync_group_options, SyncOutput, SyncReport};
pub use filter::{filter_book, FilterOptions, FilterOutcome};
pub use publish::{publish_lead_times, PublishOutcome, Templates};
/// Re-export collaborator traits and their bundled implementations.
pub use source::{LocalWorkbooks, RangeSource};
pub use store::{InventoryStore, SqliteInventory};
pub use text::TermSet;
