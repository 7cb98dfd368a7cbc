use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use plant_linker::breakdown::{iso_breakdown, pnid_breakdown, LineSortOrder};
use plant_linker::export::{self, ExportDataset, ExportFormat};
use plant_linker::{
    compute_insights, filter_iso, filter_pnid, init_logging, link, Config, Dataset,
    FilterOptions, Filters,
};

#[derive(Parser)]
#[command(name = "plant-linker")]
#[command(about = "Normalize PNID / isometric extraction output and link them by line id")]
#[command(version)]
struct Cli {
    /// Config file (default: $PLANT_LINKER_CONFIG or ./plant-linker.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct InputArgs {
    /// Raw PNID payload or job snapshot (JSON)
    #[arg(long)]
    pnid: Option<PathBuf>,

    /// Raw ISO payload or job snapshot (JSON)
    #[arg(long)]
    iso: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    #[arg(long)]
    material: Option<String>,

    #[arg(long)]
    equipment_type: Option<String>,

    #[arg(long)]
    element_type: Option<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Filters {
        Filters::new(
            self.material.as_deref(),
            self.equipment_type.as_deref(),
            self.element_type.as_deref(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print both canonical datasets
    Normalize {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the linking table and its summary
    Link {
        #[command(flatten)]
        input: InputArgs,

        /// Case-insensitive search over line id, size, material, element type
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the insights report over the (filtered) data
    Insights {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print PNID and ISO breakdown tables
    Breakdown {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// count-desc, count-asc, size-desc, size-asc, material-asc, material-desc
        #[arg(long, default_value = "count-desc")]
        sort: LineSortOrder,
    },
    /// Export filtered records as CSV or JSON
    Export {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// pnid or iso
        #[arg(long)]
        dataset: ExportDataset,

        /// csv or json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the values available to filter on
    Options {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    init_logging(&config.logging)?;

    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Normalize { input } => {
            let dataset = load_dataset(&config, &input)?;
            print_json(&dataset)?;
        }
        Commands::Link { input, search } => {
            let dataset = load_dataset(&config, &input)?;
            let report = link(&dataset.pnid.lines, &dataset.iso.elements);
            let rows = match search.as_deref() {
                Some(text) => report.search(text),
                None => report.rows(),
            };
            print_json(&json!({
                "summary": report.summary(),
                "rows": rows,
                "errors": dataset.errors,
            }))?;
        }
        Commands::Insights { input, filters } => {
            let dataset = load_dataset(&config, &input)?;
            let filters = filters.to_filters();
            let pnid = filter_pnid(&dataset.pnid, &filters);
            let iso = filter_iso(&dataset.iso, &filters);

            let report = compute_insights(&pnid, &iso, config.insights.top_materials);
            tracing::info!("{}", report.summary());
            print_json(&json!({
                "insights": report,
                "errors": dataset.errors,
            }))?;
        }
        Commands::Breakdown {
            input,
            filters,
            sort,
        } => {
            let dataset = load_dataset(&config, &input)?;
            let filters = filters.to_filters();
            let pnid = filter_pnid(&dataset.pnid, &filters);
            let iso = filter_iso(&dataset.iso, &filters);

            print_json(&json!({
                "pnid": pnid_breakdown(&pnid, sort),
                "iso": iso_breakdown(&iso),
            }))?;
        }
        Commands::Export {
            input,
            filters,
            dataset: which,
            format,
            out,
        } => {
            let dataset = load_dataset(&config, &input)?;
            let filters = filters.to_filters();

            let records = match which {
                ExportDataset::Pnid => export::pnid_records(&filter_pnid(&dataset.pnid, &filters))?,
                ExportDataset::Iso => export::iso_records(&filter_iso(&dataset.iso, &filters))?,
            };
            let body = export::render(&records, format)?;

            match out {
                Some(path) => write_export(&path, &body, records.len())?,
                None => print!("{}", body),
            }
        }
        Commands::Options { input } => {
            let dataset = load_dataset(&config, &input)?;
            print_json(&FilterOptions::collect(&dataset.pnid, &dataset.iso))?;
        }
    }

    Ok(())
}

/// Command-line paths win over config paths
fn load_dataset(config: &Config, input: &InputArgs) -> Result<Dataset> {
    let pnid = input.pnid.as_ref().or(config.input.pnid_path.as_ref());
    let iso = input.iso.as_ref().or(config.input.iso_path.as_ref());

    if pnid.is_none() && iso.is_none() {
        tracing::warn!("No input files given (use --pnid / --iso or [input] in config)");
    }

    let dataset = Dataset::load(pnid.map(PathBuf::as_path), iso.map(PathBuf::as_path))?;
    for error in &dataset.errors {
        eprintln!("⚠️  {}", error);
    }
    Ok(dataset)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

fn write_export(path: &Path, body: &str, count: usize) -> Result<()> {
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("✓ Exported {} records to {}", count, path.display());
    Ok(())
}
