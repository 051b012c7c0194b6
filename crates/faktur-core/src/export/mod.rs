//! Spreadsheet export.
//!
//! Layout is built as a list of [`SheetRow`]s first and written to a
//! `rust_xlsxwriter` worksheet afterwards, so the layout can be inspected
//! without reading the workbook back.

mod generic_sheet;
mod invoice_sheet;

pub use generic_sheet::{generic_layout, generic_workbook};
pub use invoice_sheet::{invoice_layout, invoice_workbook};

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;

use crate::error::{ExportError, Result};
use crate::flatten::display_scalar;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Cell for an optional string field.
    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => Cell::Text(s.to_string()),
            _ => Cell::Empty,
        }
    }

    /// Cell for an optional amount.
    pub fn amount(value: Option<Decimal>) -> Self {
        value
            .and_then(|d| d.to_f64())
            .map(Cell::Number)
            .unwrap_or(Cell::Empty)
    }

    /// Cell for a JSON scalar.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Empty,
            Some(Value::Number(n)) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Some(other) => Cell::Text(display_scalar(other)),
        }
    }
}

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetRow {
    /// Bold section title.
    Title(String),
    /// Label in the first column, value in the second.
    Field(String, Cell),
    /// Bold table header.
    Header(Vec<String>),
    /// Plain table row.
    Cells(Vec<Cell>),
    /// Section separator.
    Blank,
}

impl SheetRow {
    pub(crate) fn field(label: &str, cell: Cell) -> Self {
        SheetRow::Field(label.to_string(), cell)
    }
}

/// Write rows into a new worksheet of `workbook`.
pub(crate) fn write_sheet(
    workbook: &mut Workbook,
    sheet_name: &str,
    rows: &[SheetRow],
) -> std::result::Result<(), XlsxError> {
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let mut widths: Vec<usize> = Vec::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let r = row_idx as u32;
        match row {
            SheetRow::Title(title) => {
                worksheet.write_string_with_format(r, 0, title, &bold)?;
            }
            SheetRow::Field(label, cell) => {
                worksheet.write_string(r, 0, label)?;
                track_width(&mut widths, 0, label);
                write_cell(worksheet, r, 1, cell, &mut widths)?;
            }
            SheetRow::Header(headers) => {
                for (col, header) in headers.iter().enumerate() {
                    worksheet.write_string_with_format(r, col as u16, header, &bold)?;
                    track_width(&mut widths, col, header);
                }
            }
            SheetRow::Cells(cells) => {
                for (col, cell) in cells.iter().enumerate() {
                    write_cell(worksheet, r, col as u16, cell, &mut widths)?;
                }
            }
            SheetRow::Blank => {}
        }
    }

    for (col, width) in widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, (*width).clamp(8, 60) as f64 + 2.0)?;
    }

    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    widths: &mut Vec<usize>,
) -> std::result::Result<(), XlsxError> {
    match cell {
        Cell::Text(s) => {
            worksheet.write_string(row, col, s)?;
            track_width(widths, col as usize, s);
        }
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
            track_width(widths, col as usize, &n.to_string());
        }
        Cell::Empty => {}
    }
    Ok(())
}

fn track_width(widths: &mut Vec<usize>, col: usize, text: &str) {
    if widths.len() <= col {
        widths.resize(col + 1, 0);
    }
    widths[col] = widths[col].max(text.chars().count());
}

/// Serialize a workbook to bytes.
pub fn to_bytes(workbook: &mut Workbook) -> Result<Vec<u8>> {
    workbook
        .save_to_buffer()
        .map_err(|e| ExportError::Xlsx(e).into())
}

/// Save a workbook to disk.
pub fn save(workbook: &mut Workbook, path: &Path) -> Result<()> {
    workbook.save(path).map_err(ExportError::Xlsx)?;
    Ok(())
}
