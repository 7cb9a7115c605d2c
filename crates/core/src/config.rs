//! YAML configuration.
//!
//! Every field has a default matching the shop's production layout, so an
//! empty file (or no file at all) yields a usable configuration.

use crate::error::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub group_options: GroupOptionsConfig,
    pub lead_times: LeadTimesConfig,
    pub filter: FilterConfig,
}

impl ReconConfig {
    /// Load configuration from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReconResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from YAML text. Blank text gives the defaults.
    pub fn from_yaml_str(content: &str) -> ReconResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ReconResult<()> {
        if self.group_options.start_row == 0 {
            return Err(ReconError::Config(
                "group_options.start_row must be at least 1".to_string(),
            ));
        }
        if self.lead_times.stores.is_empty() {
            return Err(ReconError::Config(
                "lead_times.stores must name at least one store".to_string(),
            ));
        }
        Ok(())
    }
}

/// Layout of the combo blockout group-options upload workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOptionsConfig {
    pub sheets: Vec<GroupSheet>,
    /// Header of the bare fabric-name column.
    pub name_header: String,
    /// Header of the `fabric|colour|code` column.
    pub triple_header: String,
    /// First data row of both columns.
    pub start_row: usize,
}

impl Default for GroupOptionsConfig {
    fn default() -> Self {
        Self {
            sheets: vec![
                GroupSheet::new("ROLLCB", "ROLL", false),
                GroupSheet::new("WSROLLCB", "WSROLL", false),
                GroupSheet::new("ROLLFLEX", "ROLLFLEX", true),
                GroupSheet::new("WSROLLFLEX", "WSROLLFLEX", true),
            ],
            name_header: "BLOCKOUTFABRIC".to_string(),
            triple_header: "BLOCKOUTFABRICCOLOUR".to_string(),
            start_row: 17,
        }
    }
}

/// One workbook sheet and the inventory group that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSheet {
    pub name: String,
    pub group: String,
    /// Flex sheets carry a `YES|` marker in front of each bare name.
    #[serde(default)]
    pub flex: bool,
}

impl GroupSheet {
    #[must_use]
    pub fn new(name: &str, group: &str, flex: bool) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            flex,
        }
    }
}

/// Defaults for the term filter pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub case_sensitive: bool,
    pub search_sheet_names: bool,
    pub prune_rows: bool,
    pub header_rows: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            search_sheet_names: true,
            prune_rows: true,
            header_rows: 1,
        }
    }
}

/// Sources, column roles and template layout for lead-time publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadTimesConfig {
    /// One lead-time tab per store, in output order.
    pub stores: Vec<StoreSource>,
    /// The shared cutoff tab.
    pub cutoff: TabSource,
    pub lead_columns: LeadColumns,
    pub cutoff_columns: CutoffColumns,
    /// Column span fetched from every tab, e.g. `A:Z`.
    pub fetch_columns: String,
    pub insertion: InsertionColumns,
    /// Column holding the "Do Not Show?" flags.
    pub anchor_column: String,
    /// Row holding the anchor column's header; the anchor is searched below it.
    pub anchor_header_row: usize,
    /// Written in front of Detailed cells that have no `Lead Time:` label.
    /// `{LEAD}` is replaced with the lead text.
    pub detailed_prefix_template: Option<String>,
    /// Shown in HTML output when a product has no lead text.
    pub placeholder: String,
}

impl Default for LeadTimesConfig {
    fn default() -> Self {
        Self {
            stores: vec![
                StoreSource::new("CANBERRA", "lead_times", "Canberra"),
                StoreSource::new("REGIONAL", "lead_times", "Regional"),
            ],
            cutoff: TabSource {
                sheet_id: "cutoffs".to_string(),
                tab: "Cutoffs".to_string(),
            },
            lead_columns: LeadColumns::default(),
            cutoff_columns: CutoffColumns::default(),
            fetch_columns: "A:Z".to_string(),
            insertion: InsertionColumns::default(),
            anchor_column: "F".to_string(),
            anchor_header_row: 2,
            detailed_prefix_template: None,
            placeholder: "TBC".to_string(),
        }
    }
}

/// A tab inside a tabular source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSource {
    pub sheet_id: String,
    pub tab: String,
}

impl TabSource {
    /// The `Tab!A:Z` range string for this tab.
    #[must_use]
    pub fn range(&self, columns: &str) -> String {
        format!("{}!{}", self.tab, columns)
    }
}

/// A store and the tab carrying its lead times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSource {
    pub name: String,
    #[serde(flatten)]
    pub source: TabSource,
}

impl StoreSource {
    #[must_use]
    pub fn new(name: &str, sheet_id: &str, tab: &str) -> Self {
        Self {
            name: name.to_string(),
            source: TabSource {
                sheet_id: sheet_id.to_string(),
                tab: tab.to_string(),
            },
        }
    }
}

/// Column letters of the lead-time tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadColumns {
    pub product: String,
    pub mapping: String,
    pub lead_time: String,
}

impl Default for LeadColumns {
    fn default() -> Self {
        Self {
            product: "A".to_string(),
            mapping: "B".to_string(),
            lead_time: "C".to_string(),
        }
    }
}

/// Column letters of the cutoff tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoffColumns {
    pub product: String,
    pub mapping: String,
    pub cutoff_date: String,
}

impl Default for CutoffColumns {
    fn default() -> Self {
        Self {
            product: "B".to_string(),
            mapping: "C".to_string(),
            cutoff_date: "G".to_string(),
        }
    }
}

/// Insertion column per template kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertionColumns {
    pub detailed: String,
    pub summary: String,
}

impl Default for InsertionColumns {
    fn default() -> Self {
        Self {
            detailed: "B".to_string(),
            summary: "C".to_string(),
        }
    }
}
