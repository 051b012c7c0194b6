//! Flatten command - dump any JSON document as key/value rows.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use faktur_core::flatten::Flattener;

use super::load_config;
use super::output::{self, OutputFormat};

/// Arguments for the flatten command.
#[derive(Args)]
pub struct FlattenArgs {
    /// JSON file to flatten
    #[arg(required = true)]
    input: PathBuf,

    /// Prefix for every key
    #[arg(long, default_value = "")]
    prefix: String,

    /// Sheet name for xlsx output (default: from config)
    #[arg(long)]
    sheet: Option<String>,

    /// Output file (default: stdout; required for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,
}

pub fn run(args: FlattenArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let content = fs::read_to_string(&args.input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.input.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {}", args.input.display(), e))?;

    let rows = Flattener::new()
        .with_max_depth(config.extraction.max_flatten_depth)
        .flatten(&value, &args.prefix)?;

    let json = serde_json::to_value(&rows)?;
    let sheet = args.sheet.as_deref().unwrap_or(&config.export.generic_sheet);

    output::emit_rows(&rows, &json, args.format, args.output.as_deref(), sheet)
}
