//! dppi CLI: merge raw publication metadata and derive outputs from it.
//!
//! Usage:
//!   dppi merge <input_dir> <output_prefix> [--config path] [--year 2023]
//!   dppi csv <input_jsonl> <output_csv>
//!   dppi graph <input_jsonl> <output_json>

use clap::{Parser, Subcommand};
use dppi::pipeline::write_csv_from_jsonl;
use dppi::{CoauthorGraph, MergeConfig, Pipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dppi",
    version,
    about = "Normalise and merge iPRES publication metadata"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every recognized file of a directory into <prefix>.jsonl and <prefix>.csv
    Merge {
        /// Directory of raw source files
        input_dir: PathBuf,
        /// Output path without extension
        output_prefix: PathBuf,
        /// JSON file with run settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Conference year for files whose name carries none
        #[arg(long)]
        year: Option<i32>,
    },
    /// Flatten a merged JSON-Lines file into CSV
    Csv {
        input_jsonl: PathBuf,
        output_csv: PathBuf,
    },
    /// Build the co-authorship graph of a merged JSON-Lines file
    Graph {
        input_jsonl: PathBuf,
        output_json: PathBuf,
    },
}

fn cmd_merge(
    input_dir: &Path,
    output_prefix: &Path,
    config: Option<PathBuf>,
    year: Option<i32>,
) -> dppi::Result<()> {
    let mut config = match config {
        Some(path) => MergeConfig::from_file(&path)?,
        None => MergeConfig::new(),
    };
    if let Some(year) = year {
        config.set_year(year);
    }
    let summary = Pipeline::new(config).run(input_dir, output_prefix)?;
    println!(
        "Merged {} records from {} files ({} skipped)",
        summary.records_written, summary.files_processed, summary.files_skipped
    );
    Ok(())
}

fn cmd_csv(input: &Path, output: &Path) -> dppi::Result<()> {
    let rows = write_csv_from_jsonl(input, output)?;
    println!("Wrote {rows} rows to {}", output.display());
    Ok(())
}

fn cmd_graph(input: &Path, output: &Path) -> dppi::Result<()> {
    let graph = CoauthorGraph::from_jsonl(input)?;
    graph.write_json(output)?;
    println!(
        "Wrote {} creators and {} links to {}",
        graph.nodes.len(),
        graph.links.len(),
        output.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Merge {
            input_dir,
            output_prefix,
            config,
            year,
        } => cmd_merge(&input_dir, &output_prefix, config, year),
        Commands::Csv {
            input_jsonl,
            output_csv,
        } => cmd_csv(&input_jsonl, &output_csv),
        Commands::Graph {
            input_jsonl,
            output_json,
        } => cmd_graph(&input_jsonl, &output_json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
