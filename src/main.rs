use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use sitecheck_tools::aggregate::{AssigneeFilter, Selection};
use sitecheck_tools::layout::SheetLayout;
use sitecheck_tools::model::ProjectMetadata;
use sitecheck_tools::sync;
use sitecheck_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let layout = match &cli.layout {
        Some(path) => SheetLayout::from_json_file(path)?,
        None => SheetLayout::default(),
    };

    match cli.command {
        Command::Inspect(args) => {
            let sheet = sync::load_checklist(&args.input, &layout)?;
            emit_json(&sheet, args.output.as_deref())
        }
        Command::Evaluate(args) => {
            let (sheet, rollup) = sync::evaluate_checklist(&args.input, &layout)?;
            let filter = AssigneeFilter::from(args.assignee);
            let report = EvaluationReport {
                metadata: &sheet.metadata,
                assignees: rollup.assignees().collect(),
                selection: rollup.select(&filter),
            };
            emit_json(&report, args.output.as_deref())
        }
        Command::Rewrite(args) => sync::rewrite_checklist(&args.input, &args.output, &layout),
    }
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationReport<'a> {
    metadata: &'a ProjectMetadata,
    assignees: Vec<&'a str>,
    #[serde(flatten)]
    selection: Selection<'a>,
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Inspect, score, and rewrite construction inspection checklists."
)]
struct Cli {
    /// JSON file overriding the sheet layout conventions.
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a checklist into JSON metadata and rows.
    Inspect(InspectArgs),
    /// Roll checklist scores up by category, optionally for one assignee.
    Evaluate(EvaluateArgs),
    /// Decode a checklist and write it back out in the canonical layout.
    Rewrite(RewriteArgs),
}

#[derive(clap::Args)]
struct InspectArgs {
    /// Checklist workbook.
    #[arg(long)]
    input: PathBuf,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct EvaluateArgs {
    /// Checklist workbook.
    #[arg(long)]
    input: PathBuf,

    /// Only report rows assigned to this person.
    #[arg(long)]
    assignee: Option<String>,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RewriteArgs {
    /// Checklist workbook to read.
    #[arg(long)]
    input: PathBuf,

    /// Workbook to write.
    #[arg(long)]
    output: PathBuf,
}
