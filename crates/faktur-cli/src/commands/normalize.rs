//! Normalize command - run the invoice normalizer on a saved model response.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use faktur_core::flatten::Flattener;
use faktur_core::invoice::Normalizer;
use faktur_core::source::load_source_text;

use super::load_config;
use super::output::{self, OutputFormat};

/// Arguments for the normalize command.
#[derive(Args)]
pub struct NormalizeArgs {
    /// File holding the model's answer
    #[arg(long = "json", required = true)]
    json: PathBuf,

    /// Recognized text of the document, searched for the VAT-inclusive marker
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Output file (default: stdout; required for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Check invoice totals against line items
    #[arg(long)]
    validate: bool,
}

pub fn run(args: NormalizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let response = fs::read_to_string(&args.json)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.json.display(), e))?;
    let source_text = match &args.source {
        Some(path) => load_source_text(path, &config.pdf)?.text,
        None => String::new(),
    };

    let normalizer = Normalizer::from_config(&config.extraction);
    let invoice = match normalizer.parse(&response, &source_text) {
        Ok(invoice) => invoice,
        Err(err) => {
            eprintln!("{} {}", style("✗").red(), err);
            if let Some(raw) = err.raw_response() {
                eprintln!("{}", style("Raw model response:").dim());
                eprintln!("{}", raw);
            }
            return Err(err.into());
        }
    };
    info!(
        "Normalized invoice {} (VAT overridden: {})",
        invoice.record.invoice_meta.invoice_no, invoice.vat_overridden
    );

    output::report_warnings(&invoice);
    if args.validate {
        output::report_validation(&invoice);
    }

    let flattener = Flattener::new().with_max_depth(config.extraction.max_flatten_depth);
    output::emit_invoice(
        &invoice,
        &serde_json::to_value(&invoice)?,
        args.format,
        args.output.as_deref(),
        &config.export.invoice_sheet,
        &flattener,
    )
}
