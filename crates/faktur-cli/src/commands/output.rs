//! Rendering results in the supported output formats.

use std::fs;
use std::path::Path;

use console::style;
use serde_json::Value;

use faktur_core::export;
use faktur_core::flatten::{FlatRow, Flattener, display_scalar};
use faktur_core::invoice::NormalizedInvoice;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook (requires --output)
    Xlsx,
    /// JSON output
    Json,
    /// Key/value CSV
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Write an invoice. `json` is what the JSON format prints.
pub fn emit_invoice(
    invoice: &NormalizedInvoice,
    json: &Value,
    format: OutputFormat,
    output: Option<&Path>,
    sheet_name: &str,
    flattener: &Flattener,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Xlsx => {
            let path = require_output(output)?;
            let mut workbook = export::invoice_workbook(invoice, sheet_name, flattener)?;
            export::save(&mut workbook, path)?;
            report_written(path);
            Ok(())
        }
        OutputFormat::Json => write_or_print(&serde_json::to_string_pretty(json)?, output),
        OutputFormat::Csv => {
            let rows = flattener.flatten(&serde_json::to_value(&invoice.record)?, "")?;
            write_or_print(&rows_csv(&rows)?, output)
        }
        OutputFormat::Text => write_or_print(&invoice_text(invoice), output),
    }
}

/// Write flattened rows of a free-form document.
pub fn emit_rows(
    rows: &[FlatRow],
    json: &Value,
    format: OutputFormat,
    output: Option<&Path>,
    sheet_name: &str,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Xlsx => {
            let path = require_output(output)?;
            let mut workbook = export::generic_workbook(rows, sheet_name)?;
            export::save(&mut workbook, path)?;
            report_written(path);
            Ok(())
        }
        OutputFormat::Json => write_or_print(&serde_json::to_string_pretty(json)?, output),
        OutputFormat::Csv => write_or_print(&rows_csv(rows)?, output),
        OutputFormat::Text => write_or_print(&rows_text(rows), output),
    }
}

/// `Key,Value` CSV of flattened rows.
pub fn rows_csv(rows: &[FlatRow]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Key", "Value"])?;
    for row in rows {
        wtr.write_record([row.path.as_str(), display_scalar(&row.value).as_str()])?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn rows_text(rows: &[FlatRow]) -> String {
    let mut output = String::new();
    for row in rows {
        output.push_str(&format!("{}: {}\n", row.path, display_scalar(&row.value)));
    }
    output
}

pub fn invoice_text(invoice: &NormalizedInvoice) -> String {
    let record = &invoice.record;
    let currency = &record.currency;
    let amount = |value: Option<rust_decimal::Decimal>| {
        value.map(|d| format!("{} {}", d, currency)).unwrap_or_else(|| "-".to_string())
    };

    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", record.invoice_meta.invoice_no));
    output.push_str(&format!("Date: {}\n", record.invoice_meta.invoice_date));
    if let Some(po) = &record.invoice_meta.po_number {
        output.push_str(&format!("PO: {}\n", po));
    }
    output.push('\n');

    output.push_str("Seller:\n");
    output.push_str(&format!("  {}\n", record.seller.company_name));
    if let Some(tax_id) = &record.seller.tax_id {
        output.push_str(&format!("  NPWP: {}\n", tax_id));
    }
    output.push_str(&format!("  {}\n", record.seller.address));
    output.push('\n');

    output.push_str("Buyer:\n");
    output.push_str(&format!("  {}\n", record.buyer.company_name));
    if let Some(attention) = &record.buyer.attention {
        output.push_str(&format!("  Attn: {}\n", attention));
    }
    output.push('\n');

    output.push_str(&format!("Items: {}\n\n", record.line_items.len()));

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal: {}\n", amount(record.subtotal)));
    output.push_str(&format!("  Discount: {}\n", amount(record.discount)));
    output.push_str(&format!("  VAT:      {}\n", amount(record.vat)));
    output.push_str(&format!("  Total:    {}\n", amount(record.total)));
    output.push_str(&format!(
        "  DPP {} / VAT {} (calculated)\n",
        invoice.calculation.dpp, invoice.calculation.vat_calculated
    ));
    if invoice.vat_overridden {
        output.push_str("  Prices include VAT; VAT replaced by the calculated value\n");
    }

    if let Some(due) = &record.invoice_meta.due_date {
        output.push_str(&format!("\nPayment due: {}\n", due));
    }

    output
}

/// Print mapping warnings and missing fields to stderr.
pub fn report_warnings(invoice: &NormalizedInvoice) {
    for warning in &invoice.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }
    if !invoice.missing_fields.is_empty() {
        eprintln!(
            "{} Missing fields: {}",
            style("!").yellow(),
            invoice.missing_fields.join(", ")
        );
    }
}

/// Print reconciliation issues to stderr.
pub fn report_validation(invoice: &NormalizedInvoice) {
    let issues = invoice.record.validate();
    if issues.is_empty() {
        eprintln!("{} Totals reconcile", style("✓").green());
    } else {
        eprintln!("{}", style("Validation issues:").yellow());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
    }
}

fn require_output(output: Option<&Path>) -> anyhow::Result<&Path> {
    output.ok_or_else(|| anyhow::anyhow!("xlsx output needs a file; pass --output <file.xlsx>"))
}

fn write_or_print(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            report_written(path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn report_written(path: &Path) {
    eprintln!("{} Output written to {}", style("✓").green(), path.display());
}
