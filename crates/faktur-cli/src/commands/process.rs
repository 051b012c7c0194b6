//! Process command - extract data from a single document.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use faktur_core::flatten::Flattener;
use faktur_core::models::config::FakturConfig;
use faktur_core::models::document::DocumentKind;
use faktur_core::pipeline::{DocumentPipeline, DocumentResult, Outcome};
use faktur_core::source::load_source_text;

use super::output::{self, OutputFormat};
use super::{KindArg, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (OCR text file or PDF with a text layer)
    #[arg(required = true)]
    input: PathBuf,

    /// Document kind
    #[arg(short, long, value_enum, default_value = "invoice")]
    kind: KindArg,

    /// Output file (default: stdout; required for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Check invoice totals against line items
    #[arg(long)]
    validate: bool,

    /// Print the model's raw answer to stderr
    #[arg(long)]
    show_raw: bool,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let source = load_source_text(&args.input, &config.pdf)?;
    debug!("Source text: {} characters ({:?})", source.text.chars().count(), source.origin);

    let pipeline = DocumentPipeline::from_config(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let kind = DocumentKind::from(args.kind);
    pb.set_message(format!("Extracting {}...", kind));
    let result = pipeline.process(kind, &source);
    pb.finish_and_clear();
    let result = result?;

    if args.show_raw {
        eprintln!("{}", style("Model response:").dim());
        eprintln!("{}", result.llm_response);
    }

    write_result(
        &result,
        &config,
        pipeline.flattener(),
        args.format,
        args.output.as_deref(),
        args.validate,
    )?;

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Write one result in the requested format. Unparsed results are an error.
pub fn write_result(
    result: &DocumentResult,
    config: &FakturConfig,
    flattener: &Flattener,
    format: OutputFormat,
    output: Option<&Path>,
    validate: bool,
) -> anyhow::Result<()> {
    match &result.outcome {
        Outcome::Invoice(invoice) => {
            output::report_warnings(invoice);
            if validate {
                output::report_validation(invoice);
            }
            output::emit_invoice(
                invoice,
                &result.to_json()?,
                format,
                output,
                &config.export.invoice_sheet,
                flattener,
            )
        }
        Outcome::Structured { rows, .. } => output::emit_rows(
            rows,
            &result.to_json()?,
            format,
            output,
            result.kind.sheet_name(),
        ),
        Outcome::Unparsed(err) => {
            eprintln!("{} {}", style("✗").red(), err);
            eprintln!("{}", style("Raw model response:").dim());
            eprintln!("{}", result.llm_response);
            anyhow::bail!("Could not extract {} data: {}", result.kind, err)
        }
    }
}
