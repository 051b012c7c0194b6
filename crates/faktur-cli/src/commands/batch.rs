//! Batch processing command for multiple documents.
//!
//! Files are processed one after another in sorted glob order.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use faktur_core::models::document::DocumentKind;
use faktur_core::pipeline::{DocumentPipeline, DocumentResult};
use faktur_core::source::{is_supported, load_source_text};
use faktur_core::{CompletionBackend, FakturConfig};

use super::output::OutputFormat;
use super::process::write_result;
use super::{KindArg, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Document kind of every file
    #[arg(short, long, value_enum, default_value = "invoice")]
    kind: KindArg,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: OutputFormat,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of one file.
struct FileResult {
    path: PathBuf,
    result: Option<DocumentResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = DocumentPipeline::from_config(&config)?;
    let kind = DocumentKind::from(args.kind);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        pb.set_message(file_name(&path).to_string());
        let file_start = Instant::now();

        let outcome = process_file(&path, kind, &pipeline, &config, &args);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => results.push(FileResult {
                path,
                result: Some(result),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let message = format!("{:#}", e);
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), message);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), message);
                }
                warn!("Failed to process {}: {}", path.display(), message);
                results.push(FileResult {
                    path,
                    result: None,
                    error: Some(message),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let failed = results.iter().filter(|r| r.error.is_some()).count();

    if args.summary {
        let summary_path = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:.1}s",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs_f64()
    );
    println!("  {} successful", style(results.len() - failed).green());
    if failed > 0 {
        println!("  {} failed", style(failed).red());
        for result in results.iter().filter(|r| r.error.is_some()) {
            println!(
                "    - {}: {}",
                file_name(&result.path),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_file<B: CompletionBackend>(
    path: &Path,
    kind: DocumentKind,
    pipeline: &DocumentPipeline<B>,
    config: &FakturConfig,
    args: &BatchArgs,
) -> anyhow::Result<DocumentResult> {
    info!("Processing {}", path.display());

    let source = load_source_text(path, &config.pdf)?;
    let result = pipeline.process(kind, &source)?;

    let output = output_path(path, args.output_dir.as_deref(), args.format);
    write_result(
        &result,
        config,
        pipeline.flattener(),
        args.format,
        Some(&output),
        false,
    )?;

    Ok(result)
}

/// `<dir>/<stem>.<ext>`, where `dir` defaults to the input's directory.
fn output_path(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}.{}", stem, format.extension()))
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "kind",
        "status",
        "invoice_no",
        "subtotal",
        "vat",
        "total",
        "currency",
        "processing_time_ms",
        "error",
    ])?;

    let amount = |value: Option<rust_decimal::Decimal>| value.map(|d| d.to_string()).unwrap_or_default();

    for result in results {
        let filename = file_name(&result.path);
        let time = result.processing_time_ms.to_string();

        match &result.result {
            Some(doc) => match doc.invoice() {
                Some(invoice) => {
                    let record = &invoice.record;
                    wtr.write_record([
                        filename,
                        doc.kind.as_str(),
                        "success",
                        &record.invoice_meta.invoice_no,
                        &amount(record.subtotal),
                        &amount(record.vat),
                        &amount(record.total),
                        &record.currency,
                        &time,
                        "",
                    ])?;
                }
                None => {
                    wtr.write_record([
                        filename,
                        doc.kind.as_str(),
                        "success",
                        "",
                        "",
                        "",
                        "",
                        "",
                        &time,
                        "",
                    ])?;
                }
            },
            None => {
                wtr.write_record([
                    filename,
                    "",
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &time,
                    result.error.as_deref().unwrap_or(""),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
