//! Normalized invoice record.
//!
//! Field names follow the canonical schema; aliases accept the key names the
//! extraction prompt asks the language model for.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::lenient;

/// Currency used when the document does not state one.
pub const DEFAULT_CURRENCY: &str = "IDR";

/// Tolerance for totals reconciliation, in currency units.
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A complete invoice as extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    /// Issuing party.
    #[serde(alias = "seller_identity", deserialize_with = "lenient::record")]
    pub seller: Party,

    /// Receiving party.
    #[serde(alias = "buyer_identity", deserialize_with = "lenient::record")]
    pub buyer: Party,

    /// Invoice number, dates and references.
    #[serde(alias = "invoice_details", deserialize_with = "lenient::record")]
    pub invoice_meta: InvoiceMeta,

    /// Line items in document order.
    #[serde(alias = "item_details", deserialize_with = "lenient::line_items")]
    pub line_items: Vec<LineItem>,

    /// Sum of line items as printed on the invoice.
    #[serde(alias = "subtotal_invoice", deserialize_with = "lenient::amount")]
    pub subtotal: Option<Decimal>,

    /// Discount as printed; informational only.
    #[serde(deserialize_with = "lenient::amount")]
    pub discount: Option<Decimal>,

    /// VAT amount (PPN).
    #[serde(deserialize_with = "lenient::amount")]
    pub vat: Option<Decimal>,

    /// Amount due.
    #[serde(alias = "invoice_total", deserialize_with = "lenient::amount")]
    pub total: Option<Decimal>,

    /// Payment details.
    #[serde(alias = "bank", deserialize_with = "lenient::record")]
    pub bank_details: BankDetails,

    /// Currency code. Empty until the normalizer fills in the default.
    #[serde(deserialize_with = "lenient::text")]
    pub currency: String,
}

/// Seller or buyer identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    #[serde(alias = "name", deserialize_with = "lenient::text")]
    pub company_name: String,

    #[serde(deserialize_with = "lenient::text")]
    pub address: String,

    #[serde(alias = "email_address", deserialize_with = "lenient::text")]
    pub email: String,

    #[serde(deserialize_with = "lenient::opt_text")]
    pub phone: Option<String>,

    /// NPWP or other tax identification number.
    #[serde(alias = "company_npwp_tin", alias = "npwp", deserialize_with = "lenient::opt_text")]
    pub tax_id: Option<String>,

    /// Contact person; only meaningful for the buyer.
    #[serde(deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub attention: Option<String>,
}

/// Invoice header information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceMeta {
    #[serde(alias = "invoice_number", deserialize_with = "lenient::text")]
    pub invoice_no: String,

    /// Issue date, expected as `YYYY-MM-DD`.
    #[serde(deserialize_with = "lenient::text")]
    pub invoice_date: String,

    #[serde(alias = "order_po_number", deserialize_with = "lenient::opt_text")]
    pub po_number: Option<String>,

    /// Due date or payment term, kept verbatim.
    #[serde(alias = "term_of_payment_due_date", deserialize_with = "lenient::opt_text")]
    pub due_date: Option<String>,
}

impl InvoiceMeta {
    /// Issue date parsed as an ISO-8601 calendar date.
    pub fn issue_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.invoice_date.trim(), "%Y-%m-%d").ok()
    }
}

/// A single line item. `amount` is taken from the document, not recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    #[serde(alias = "item_description", deserialize_with = "lenient::text")]
    pub description: String,

    #[serde(alias = "qty", deserialize_with = "lenient::amount")]
    pub quantity: Option<Decimal>,

    #[serde(deserialize_with = "lenient::amount")]
    pub unit_price: Option<Decimal>,

    #[serde(alias = "total", deserialize_with = "lenient::amount")]
    pub amount: Option<Decimal>,
}

/// Bank account the invoice should be paid to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankDetails {
    #[serde(alias = "account_number", deserialize_with = "lenient::text")]
    pub account_no: String,

    #[serde(deserialize_with = "lenient::text")]
    pub account_name: String,

    #[serde(alias = "bank", deserialize_with = "lenient::text")]
    pub beneficiary_bank: String,

    #[serde(deserialize_with = "lenient::opt_text")]
    pub branch: Option<String>,

    #[serde(deserialize_with = "lenient::opt_text")]
    pub swift_code: Option<String>,
}

/// Alternate key names accepted for a record's fields, mirroring its serde
/// aliases. Used to collapse documents that carry both spellings.
pub(crate) trait FieldAliases {
    const ALIASES: &'static [(&'static str, &'static [&'static str])];
}

impl FieldAliases for InvoiceRecord {
    const ALIASES: &'static [(&'static str, &'static [&'static str])] = &[
        ("seller", &["seller_identity"]),
        ("buyer", &["buyer_identity"]),
        ("invoice_meta", &["invoice_details"]),
        ("line_items", &["item_details"]),
        ("subtotal", &["subtotal_invoice"]),
        ("total", &["invoice_total"]),
        ("bank_details", &["bank"]),
    ];
}

impl FieldAliases for Party {
    const ALIASES: &'static [(&'static str, &'static [&'static str])] = &[
        ("company_name", &["name"]),
        ("email", &["email_address"]),
        ("tax_id", &["company_npwp_tin", "npwp"]),
    ];
}

impl FieldAliases for InvoiceMeta {
    const ALIASES: &'static [(&'static str, &'static [&'static str])] = &[
        ("invoice_no", &["invoice_number"]),
        ("po_number", &["order_po_number"]),
        ("due_date", &["term_of_payment_due_date"]),
    ];
}

impl FieldAliases for LineItem {
    const ALIASES: &'static [(&'static str, &'static [&'static str])] = &[
        ("description", &["item_description"]),
        ("quantity", &["qty"]),
        ("amount", &["total"]),
    ];
}

impl FieldAliases for BankDetails {
    const ALIASES: &'static [(&'static str, &'static [&'static str])] = &[
        ("account_no", &["account_number"]),
        ("beneficiary_bank", &["bank"]),
    ];
}

impl InvoiceRecord {
    /// Paths of mandatory fields that came back empty.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();

        for (prefix, party) in [("seller", &self.seller), ("buyer", &self.buyer)] {
            for (name, value) in [
                ("company_name", &party.company_name),
                ("address", &party.address),
                ("email", &party.email),
            ] {
                if value.is_empty() {
                    missing.push(format!("{}.{}", prefix, name));
                }
            }
        }

        if self.invoice_meta.invoice_no.is_empty() {
            missing.push("invoice_meta.invoice_no".to_string());
        }
        if self.invoice_meta.invoice_date.is_empty() {
            missing.push("invoice_meta.invoice_date".to_string());
        }

        for (name, value) in [
            ("account_no", &self.bank_details.account_no),
            ("account_name", &self.bank_details.account_name),
            ("beneficiary_bank", &self.bank_details.beneficiary_bank),
        ] {
            if value.is_empty() {
                missing.push(format!("bank_details.{}", name));
            }
        }

        missing
    }

    /// Check the record for gaps and inconsistent totals. Nothing is modified.
    pub fn validate(&self) -> Vec<String> {
        let mut issues: Vec<String> = self
            .missing_fields()
            .into_iter()
            .map(|field| format!("Missing mandatory field {}", field))
            .collect();

        if !self.invoice_meta.invoice_date.is_empty() && self.invoice_meta.issue_date().is_none() {
            issues.push(format!(
                "Invoice date '{}' is not an ISO-8601 date",
                self.invoice_meta.invoice_date
            ));
        }

        if self.line_items.is_empty() {
            issues.push("No line items".to_string());
        }

        let amounts: Vec<Decimal> = self.line_items.iter().filter_map(|i| i.amount).collect();
        if let Some(subtotal) = self.subtotal {
            if !amounts.is_empty() {
                let items_sum = amounts
                    .iter()
                    .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount));
                match items_sum {
                    Some(sum) if !within_tolerance(sum, subtotal) => issues.push(format!(
                        "Line item total ({}) differs from subtotal ({})",
                        sum, subtotal
                    )),
                    Some(_) => {}
                    None => issues.push("Line item amounts are too large to add up".to_string()),
                }
            }
        }

        if let (Some(subtotal), Some(total)) = (self.subtotal, self.total) {
            let expected = subtotal
                .checked_sub(self.discount.unwrap_or_default())
                .and_then(|d| d.checked_add(self.vat.unwrap_or_default()));
            match expected {
                Some(expected) if !within_tolerance(expected, total) => issues.push(format!(
                    "Subtotal - discount + VAT ({}) differs from invoice total ({})",
                    expected, total
                )),
                Some(_) => {}
                None => issues.push("Subtotal, discount and VAT are too large to reconcile".to_string()),
            }
        }

        issues
    }
}

fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|diff| diff.abs() <= TOLERANCE)
}
