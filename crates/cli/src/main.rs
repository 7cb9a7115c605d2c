//! # blindsops-cli
//!
//! Command-line front end for the workbook reconciliation passes.

use anyhow::{bail, Context, Result};
use blindsops_core::differ::SheetStatus;
use blindsops_core::duration::parse_upper_bound_weeks;
use blindsops_core::filter::{is_inventory_items, FilterOutcome};
use blindsops_core::publish::StorePublication;
use blindsops_core::{
    filter_book, publish_lead_times, sync_group_options, FilterOptions, LocalWorkbooks,
    ReconConfig, SqliteInventory, Templates, TermSet,
};
use blindsops_sheet::Book;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// blindsops - reconcile blinds workbooks against their sources of truth
#[derive(Parser)]
#[command(name = "blindsops")]
#[command(author, version, about = "Workbook reconciliation for blinds operations", long_about = None)]
struct Cli {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Keep only the sheets (and rows) that mention any search term
    Filter {
        /// Workbook to filter
        input: PathBuf,
        /// Text file with one search term per line
        #[arg(short, long)]
        terms: PathBuf,
        /// Where to write the filtered workbook
        #[arg(short, long)]
        output: PathBuf,
        /// Match terms case-sensitively
        #[arg(long)]
        case_sensitive: bool,
        /// Ignore sheet titles when matching
        #[arg(long)]
        no_sheet_names: bool,
        /// Keep non-matching rows in kept sheets
        #[arg(long)]
        keep_rows: bool,
    },
    /// Rewrite group-options lists from the inventory database
    SyncOptions {
        /// Group-options upload workbook
        input: PathBuf,
        /// SQLite inventory database
        #[arg(long)]
        db: PathBuf,
        /// Where to write the corrected workbook
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Publish lead times into the quote templates
    LeadTimes {
        /// Tabular source as ID=PATH.xlsx; repeat for each source id in the config
        #[arg(short, long = "source", value_name = "ID=PATH", required = true)]
        sources: Vec<String>,
        /// Detailed quote template
        #[arg(long)]
        detailed: Option<PathBuf>,
        /// Summary quote template
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Directory for the generated files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print the upper bound in weeks of lead-time texts
    LeadBound {
        /// Lead-time texts such as "2-3 weeks"
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = match &cli.config {
        Some(path) => ReconConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ReconConfig::default(),
    };

    match cli.command {
        Command::Filter {
            input,
            terms,
            output,
            case_sensitive,
            no_sheet_names,
            keep_rows,
        } => {
            let mut options = FilterOptions::from(&config.filter);
            if no_sheet_names {
                options.search_sheet_names = false;
            }
            if keep_rows {
                options.prune_rows = false;
            }
            options.inventory_items = input
                .file_name()
                .is_some_and(|name| is_inventory_items(&name.to_string_lossy()));
            let case_sensitive = case_sensitive || config.filter.case_sensitive;
            run_filter(&input, &terms, &output, case_sensitive, options)
        }
        Command::SyncOptions { input, db, output } => {
            run_sync_options(&config, &input, &db, &output)
        }
        Command::LeadTimes {
            sources,
            detailed,
            summary,
            out_dir,
        } => run_lead_times(
            &config,
            &sources,
            detailed.as_deref(),
            summary.as_deref(),
            &out_dir,
        ),
        Command::LeadBound { texts } => {
            for text in &texts {
                println!("{}\t{}", parse_upper_bound_weeks(text), text);
            }
            Ok(())
        }
    }
}

fn load_book(path: &Path) -> Result<Book> {
    Book::from_xlsx(path).with_context(|| format!("Failed to read workbook: {}", path.display()))
}

fn save_book(book: &Book, path: &Path) -> Result<()> {
    book.save_as_xlsx(path)
        .with_context(|| format!("Failed to write workbook: {}", path.display()))
}

/// Run the filter pass over one workbook.
fn run_filter(
    input: &Path,
    terms_path: &Path,
    output: &Path,
    case_sensitive: bool,
    options: FilterOptions,
) -> Result<()> {
    let raw = std::fs::read_to_string(terms_path)
        .with_context(|| format!("Failed to read terms: {}", terms_path.display()))?;
    let terms = TermSet::from_lines(&raw, case_sensitive);
    if terms.is_empty() {
        bail!("No search terms in {}", terms_path.display());
    }

    let mut book = load_book(input)?;
    match filter_book(&mut book, &terms, options)? {
        FilterOutcome::NoMatches(_) => {
            println!("{} no sheet matched any term; nothing written", "No content:".yellow().bold());
        }
        FilterOutcome::Kept(report) => {
            for sheet in &report.sheets {
                println!(
                    "{} [{}] rows {} -> {} (matching {}) terms: {}",
                    sheet.name.cyan(),
                    sheet.matched_by,
                    sheet.rows_before,
                    sheet.rows_after,
                    sheet.matching_rows,
                    sheet.matched_terms_preview
                );
            }
            save_book(&book, output)?;
            println!(
                "{} kept {} sheet(s), wrote {}",
                "Done:".green().bold(),
                report.kept_count(),
                output.display()
            );
        }
    }
    Ok(())
}

/// Run the group-options sync against a SQLite inventory.
fn run_sync_options(config: &ReconConfig, input: &Path, db: &Path, output: &Path) -> Result<()> {
    let store = SqliteInventory::open_path(db)
        .with_context(|| format!("Failed to open inventory database: {}", db.display()))?;
    let book = load_book(input)?;
    let out = sync_group_options(&book, &store, &config.group_options)?;

    for (name, status) in &out.report.sheets {
        match status {
            SheetStatus::MissingInInput => println!("{} {}", name.cyan(), "not in workbook".dimmed()),
            SheetStatus::Unchanged { names, triples } => {
                println!("{} unchanged ({names} names, {triples} triples)", name.cyan());
            }
            SheetStatus::Changed(changes) => println!(
                "{} {} names +{} -{}, triples +{} -{}",
                name.cyan(),
                "changed:".yellow(),
                changes.names_added.len(),
                changes.names_removed.len(),
                changes.triples_added.len(),
                changes.triples_removed.len()
            ),
            SheetStatus::Failed(reason) => {
                println!("{} {} {reason}", name.cyan(), "failed:".red().bold());
            }
        }
    }
    save_book(&out.book, output)?;
    println!(
        "{} {} sheet(s) changed, wrote {}",
        "Done:".green().bold(),
        out.report.changed_count(),
        output.display()
    );
    Ok(())
}

fn parse_source(spec: &str) -> Result<(&str, &Path)> {
    let (id, path) = spec
        .split_once('=')
        .with_context(|| format!("Invalid source: '{spec}'. Expected ID=PATH format"))?;
    Ok((id.trim(), Path::new(path.trim())))
}

/// Write every generated artifact of one store; returns the file names.
fn write_publication(
    store: &str,
    publication: &StorePublication,
    out_dir: &Path,
    tag: &str,
) -> Result<Vec<String>> {
    let stem = store.to_lowercase();
    let mut files = Vec::new();

    let html_name = format!("{stem}_{tag}.html");
    let html_path = out_dir.join(&html_name);
    std::fs::write(&html_path, &publication.html)
        .with_context(|| format!("Failed to write {}", html_path.display()))?;
    files.push(html_name);

    for (kind, book) in [
        ("detailed", &publication.detailed),
        ("summary", &publication.summary),
    ] {
        if let Some(book) = book {
            let name = format!("{stem}_{kind}_{tag}.xlsx");
            save_book(book, &out_dir.join(&name))?;
            files.push(name);
        }
    }
    Ok(files)
}

/// Run the lead-time publisher over local source workbooks.
fn run_lead_times(
    config: &ReconConfig,
    sources: &[String],
    detailed: Option<&Path>,
    summary: Option<&Path>,
    out_dir: &Path,
) -> Result<()> {
    let mut workbooks = LocalWorkbooks::new();
    for spec in sources {
        let (id, path) = parse_source(spec)?;
        workbooks
            .load_xlsx(id, path)
            .with_context(|| format!("Failed to load source {id}: {}", path.display()))?;
    }
    let detailed = detailed.map(load_book).transpose()?;
    let summary = summary.map(load_book).transpose()?;

    let outcome = publish_lead_times(
        &workbooks,
        &config.lead_times,
        Templates {
            detailed: detailed.as_ref(),
            summary: summary.as_ref(),
        },
    )?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let tag = chrono::Local::now().format("%Y%m%d").to_string();
    let mut failed = 0;
    for (store, result) in &outcome.stores {
        match result {
            Ok(publication) => {
                for warning in &publication.warnings {
                    println!("{} {warning}", "Warning:".yellow());
                }
                let files = write_publication(store, publication, out_dir, &tag)?;
                println!("{} {store}: {}", "Done:".green().bold(), files.join(", "));
            }
            Err(err) => {
                failed += 1;
                println!("{} {err}", "Error:".red().bold());
            }
        }
    }
    if failed == outcome.stores.len() {
        bail!("No store could be published");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        let (id, path) = parse_source("lead_times = data/leads.xlsx").unwrap();
        assert_eq!(id, "lead_times");
        assert_eq!(path, Path::new("data/leads.xlsx"));
        assert!(parse_source("leads.xlsx").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "blindsops",
            "--verbose",
            "lead-times",
            "-s",
            "lead_times=a.xlsx",
            "--source",
            "cutoffs=b.xlsx",
            "--summary",
            "summary.xlsx",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::LeadTimes {
                sources, summary, ..
            } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(summary, Some(PathBuf::from("summary.xlsx")));
            }
            _ => panic!("expected lead-times"),
        }
    }
}
