//! Sectioned invoice workbook.
//!
//! Sections, separated by blank rows: seller, buyer, invoice details, line
//! items table, totals, bank details.

use rust_xlsxwriter::Workbook;

use crate::error::{ExportError, Result};
use crate::flatten::Flattener;
use crate::invoice::NormalizedInvoice;
use crate::models::invoice::Party;

use super::{Cell, SheetRow, write_sheet};

/// Build the row layout of the invoice sheet.
pub fn invoice_layout(invoice: &NormalizedInvoice, flattener: &Flattener) -> Result<Vec<SheetRow>> {
    let record = &invoice.record;
    let mut rows = Vec::new();

    rows.push(SheetRow::Title("Seller Identity".to_string()));
    party_rows(&mut rows, &record.seller, false);
    rows.push(SheetRow::Blank);

    rows.push(SheetRow::Title("Buyer Identity".to_string()));
    party_rows(&mut rows, &record.buyer, true);
    rows.push(SheetRow::Blank);

    let meta = &record.invoice_meta;
    rows.push(SheetRow::Title("Invoice Details".to_string()));
    rows.push(SheetRow::field("Invoice No", Cell::text(Some(meta.invoice_no.as_str()))));
    rows.push(SheetRow::field("Invoice Date", Cell::text(Some(meta.invoice_date.as_str()))));
    rows.push(SheetRow::field("Order/PO Number", Cell::text(meta.po_number.as_deref())));
    rows.push(SheetRow::field(
        "Term of Payment/Due Date",
        Cell::text(meta.due_date.as_deref()),
    ));
    rows.push(SheetRow::Blank);

    let table = flattener.flatten_table(&invoice.raw_line_items)?;
    if !table.is_empty() {
        rows.push(SheetRow::Title("Item Details".to_string()));
        rows.push(SheetRow::Header(table.headers.clone()));
        for cells in &table.rows {
            rows.push(SheetRow::Cells(
                cells.iter().map(|c| Cell::from_json(c.as_ref())).collect(),
            ));
        }
        rows.push(SheetRow::Blank);
    }

    let calc = &invoice.calculation;
    rows.push(SheetRow::Title("Totals".to_string()));
    rows.push(SheetRow::field("Subtotal Invoice", Cell::amount(record.subtotal)));
    rows.push(SheetRow::field("Discount", Cell::amount(record.discount)));
    rows.push(SheetRow::field("VAT", Cell::amount(record.vat)));
    rows.push(SheetRow::field("Invoice Total", Cell::amount(record.total)));
    rows.push(SheetRow::field("Currency", Cell::text(Some(record.currency.as_str()))));
    rows.push(SheetRow::field("DPP", Cell::amount(Some(calc.dpp))));
    rows.push(SheetRow::field("VAT Calculated", Cell::amount(Some(calc.vat_calculated))));
    rows.push(SheetRow::Blank);

    let bank = &record.bank_details;
    rows.push(SheetRow::Title("Bank Details".to_string()));
    rows.push(SheetRow::field("Account No", Cell::text(Some(bank.account_no.as_str()))));
    rows.push(SheetRow::field("Account Name", Cell::text(Some(bank.account_name.as_str()))));
    rows.push(SheetRow::field("Beneficiary Bank", Cell::text(Some(bank.beneficiary_bank.as_str()))));
    rows.push(SheetRow::field("Branch", Cell::text(bank.branch.as_deref())));
    rows.push(SheetRow::field("SWIFT Code", Cell::text(bank.swift_code.as_deref())));

    Ok(rows)
}

fn party_rows(rows: &mut Vec<SheetRow>, party: &Party, with_attention: bool) {
    rows.push(SheetRow::field("Company Name", Cell::text(Some(party.company_name.as_str()))));
    rows.push(SheetRow::field("Address", Cell::text(Some(party.address.as_str()))));
    rows.push(SheetRow::field("Email Address", Cell::text(Some(party.email.as_str()))));
    rows.push(SheetRow::field("Phone", Cell::text(party.phone.as_deref())));
    rows.push(SheetRow::field("Company NPWP/TIN", Cell::text(party.tax_id.as_deref())));
    if with_attention {
        rows.push(SheetRow::field("Attention", Cell::text(party.attention.as_deref())));
    }
}

/// Build the invoice workbook with a single sheet named `sheet_name`.
pub fn invoice_workbook(
    invoice: &NormalizedInvoice,
    sheet_name: &str,
    flattener: &Flattener,
) -> Result<Workbook> {
    let rows = invoice_layout(invoice, flattener)?;
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, sheet_name, &rows).map_err(ExportError::Xlsx)?;
    Ok(workbook)
}
