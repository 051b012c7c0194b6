//! Turns an untrusted language-model response into an [`InvoiceRecord`].

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{DEFAULT_CURRENCY, InvoiceRecord};

use super::lenient::{resolve_aliases, value_to_amount, value_to_text};
use super::recovery::parse_llm_json;
use super::vat::{VatCalculation, VatRule};

/// Phrase that marks prices as VAT-inclusive.
pub const DEFAULT_INCLUSIVE_VAT_MARKER: &str = "price including vat";

/// Keys under which the line-item array may appear.
const LINE_ITEM_KEYS: [&str; 2] = ["line_items", "item_details"];

/// Top-level amount keys, canonical and prompt spellings.
const AMOUNT_KEYS: [&str; 6] = [
    "subtotal",
    "subtotal_invoice",
    "discount",
    "vat",
    "total",
    "invoice_total",
];

/// Output of a successful normalization.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedInvoice {
    /// The normalized record.
    pub record: InvoiceRecord,
    /// DPP/VAT decomposition of the subtotal, always computed.
    pub calculation: VatCalculation,
    /// Whether `record.vat` was replaced by the calculated value.
    pub vat_overridden: bool,
    /// Mandatory fields that were absent and left empty.
    pub missing_fields: Vec<String>,
    /// Problems encountered while mapping the document.
    pub warnings: Vec<String>,
    /// Line items exactly as the model returned them, keys in observed order.
    #[serde(skip)]
    pub raw_line_items: Vec<Value>,
    /// The parsed document before mapping.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

/// Invoice normalizer.
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_currency: String,
    marker: String,
    vat_rule: VatRule,
}

impl Normalizer {
    /// Create a normalizer with IDR, the literal English marker and 11% VAT.
    pub fn new() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            marker: DEFAULT_INCLUSIVE_VAT_MARKER.to_string(),
            vat_rule: VatRule::default(),
        }
    }

    /// Build from the extraction section of the configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_default_currency(&config.default_currency)
            .with_inclusive_vat_marker(&config.inclusive_vat_marker)
            .with_vat_rule(VatRule::new(config.vat_rate_percent))
    }

    /// Set the currency used when the document has none.
    pub fn with_default_currency(mut self, currency: &str) -> Self {
        self.default_currency = currency.trim().to_string();
        self
    }

    /// Set the VAT-inclusive marker phrase (matched case-insensitively).
    pub fn with_inclusive_vat_marker(mut self, marker: &str) -> Self {
        self.marker = marker.trim().to_lowercase();
        self
    }

    /// Set the VAT rule.
    pub fn with_vat_rule(mut self, rule: VatRule) -> Self {
        self.vat_rule = rule;
        self
    }

    /// Normalize one response. `source_text` is only used for marker detection.
    pub fn parse(
        &self,
        json_text: &str,
        source_text: &str,
    ) -> Result<NormalizedInvoice, ExtractionError> {
        let raw = parse_llm_json(json_text)?;
        let mut warnings = Vec::new();

        let mut mapped = raw.clone();
        resolve_aliases::<InvoiceRecord>(&mut mapped);

        let raw_line_items = LINE_ITEM_KEYS
            .iter()
            .find_map(|key| mapped.get(*key))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for key in AMOUNT_KEYS {
            if let Some(value) = mapped.get(key) {
                if value_to_text(value).is_some() && value_to_amount(value).is_none() {
                    warnings.push(format!("{} {} is not a usable amount and was ignored", key, value));
                }
            }
        }

        // Aliases are resolved and every field is lenient, so this should not fail.
        let mut record: InvoiceRecord = serde_json::from_value(Value::Object(mapped))
            .unwrap_or_else(|e| {
                warn!("Falling back to empty invoice record: {}", e);
                warnings.push(format!("Document could not be mapped: {}", e));
                InvoiceRecord::default()
            });

        let non_objects = raw_line_items.iter().filter(|item| !item.is_object()).count();
        if non_objects > 0 {
            warnings.push(format!("{} line item(s) were not objects and were skipped", non_objects));
        }
        let unmapped = raw_line_items
            .len()
            .saturating_sub(non_objects + record.line_items.len());
        if unmapped > 0 {
            warnings.push(format!("{} line item(s) could not be mapped and were skipped", unmapped));
        }

        if record.currency.is_empty() {
            debug!("No currency in document, using {}", self.default_currency);
            record.currency = self.default_currency.clone();
        }

        if record.subtotal.is_none() {
            warnings.push("No subtotal; VAT calculated from zero".to_string());
        }
        let calculation = self
            .vat_rule
            .decompose(record.subtotal.unwrap_or(Decimal::ZERO));

        let vat_overridden = self.is_vat_inclusive(source_text);
        if vat_overridden {
            info!(
                extracted = ?record.vat,
                calculated = %calculation.vat_calculated,
                "Prices include VAT, replacing extracted VAT"
            );
            record.vat = Some(calculation.vat_calculated);
        }

        let missing_fields = record.missing_fields();
        if !missing_fields.is_empty() {
            debug!("Missing mandatory fields: {:?}", missing_fields);
        }

        Ok(NormalizedInvoice {
            record,
            calculation,
            vat_overridden,
            missing_fields,
            warnings,
            raw_line_items,
            raw,
        })
    }

    /// Whether the source text declares prices as VAT-inclusive.
    pub fn is_vat_inclusive(&self, source_text: &str) -> bool {
        !self.marker.is_empty() && source_text.to_lowercase().contains(&self.marker)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with default settings.
pub fn parse_invoice(
    json_text: &str,
    source_text: &str,
) -> Result<NormalizedInvoice, ExtractionError> {
    Normalizer::new().parse(json_text, source_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const RESPONSE: &str = r#"{
        "seller_identity": {"company_name": "PT Sinar Jaya", "address": "Jakarta", "email_address": "a@b.id"},
        "invoice_details": {"invoice_no": "INV-9", "invoice_date": "2024-05-02"},
        "item_details": [
            {"item_description": "Laptop", "quantity": 1, "unit_price": 8000000, "amount": 8000000}
        ],
        "subtotal_invoice": 8000000,
        "vat": 880000,
        "invoice_total": 8880000
    }"#;

    #[test]
    fn test_marker_overrides_vat() {
        let result = parse_invoice(RESPONSE, "TOTAL\nPrice Including VAT\nThank you").unwrap();

        assert!(result.vat_overridden);
        assert_eq!(result.calculation.dpp, dec("7207207.21"));
        assert_eq!(result.calculation.vat_calculated, dec("792792.79"));
        assert_eq!(result.record.vat, Some(dec("792792.79")));
        // subtotal and total are never re-derived
        assert_eq!(result.record.subtotal, Some(dec("8000000")));
        assert_eq!(result.record.total, Some(dec("8880000")));
    }

    #[test]
    fn test_marker_overrides_null_vat() {
        let json = r#"{"subtotal": 111, "vat": null}"#;
        let result = parse_invoice(json, "PRICE INCLUDING VAT").unwrap();
        assert_eq!(result.record.vat, Some(dec("11.00")));
    }

    #[test]
    fn test_without_marker_vat_unchanged() {
        let result = parse_invoice(RESPONSE, "Subtotal 8.000.000").unwrap();
        assert!(!result.vat_overridden);
        assert_eq!(result.record.vat, Some(dec("880000")));
        // the calculation is still reported
        assert_eq!(result.calculation.vat_calculated, dec("792792.79"));
    }

    #[test]
    fn test_without_marker_null_vat_stays_null() {
        let result = parse_invoice(r#"{"subtotal": 111}"#, "").unwrap();
        assert_eq!(result.record.vat, None);
    }

    #[test]
    fn test_currency_default() {
        let result = parse_invoice(r#"{"subtotal": 1}"#, "").unwrap();
        assert_eq!(result.record.currency, "IDR");

        let result = Normalizer::new()
            .with_default_currency("USD")
            .parse(r#"{"currency": null}"#, "")
            .unwrap();
        assert_eq!(result.record.currency, "USD");

        let result = parse_invoice(r#"{"currency": "SGD"}"#, "").unwrap();
        assert_eq!(result.record.currency, "SGD");
    }

    #[test]
    fn test_missing_mandatory_fields_are_permissive() {
        let result = parse_invoice(r#"{"subtotal": 100}"#, "").unwrap();
        assert_eq!(result.record.seller.company_name, "");
        assert!(result.missing_fields.contains(&"seller.company_name".to_string()));
        assert!(result.missing_fields.contains(&"invoice_meta.invoice_date".to_string()));
    }

    #[test]
    fn test_missing_subtotal_counts_as_zero() {
        let result = parse_invoice(r#"{"vat": 5}"#, "price including VAT").unwrap();
        assert_eq!(result.calculation.dpp, Decimal::ZERO);
        assert_eq!(result.record.vat, Some(Decimal::ZERO));
        assert!(result.warnings.iter().any(|w| w.contains("No subtotal")));
    }

    #[test]
    fn test_wrapped_response() {
        let text = format!("Here you go:\n```json\n{}\n```", RESPONSE);
        let result = parse_invoice(&text, "").unwrap();
        assert_eq!(result.record.invoice_meta.invoice_no, "INV-9");
        assert_eq!(result.raw_line_items.len(), 1);
    }

    #[test]
    fn test_malformed_response_keeps_raw() {
        let err = parse_invoice("Sorry, I cannot help with that.", "").unwrap_err();
        assert_eq!(err.raw_response(), Some("Sorry, I cannot help with that."));
    }

    #[test]
    fn test_skipped_line_items_reported() {
        let json = r#"{"line_items": [{"description": "A", "amount": 1}, "B"]}"#;
        let result = parse_invoice(json, "").unwrap();
        assert_eq!(result.record.line_items.len(), 1);
        assert_eq!(result.raw_line_items.len(), 2);
        assert!(result.warnings.iter().any(|w| w.starts_with("1 line item")));
    }

    #[test]
    fn test_canonical_and_prompt_keys_together() {
        let json = r#"{
            "seller_identity": {"company_name": "PT A"},
            "invoice_details": {"invoice_no": "INV-1"},
            "subtotal": 111,
            "subtotal_invoice": 111,
            "line_items": [{"description": "Pen", "amount": 5, "total": 5}],
            "item_details": null
        }"#;
        let result = parse_invoice(json, "").unwrap();

        assert_eq!(result.record.seller.company_name, "PT A");
        assert_eq!(result.record.invoice_meta.invoice_no, "INV-1");
        assert_eq!(result.record.subtotal, Some(dec("111")));
        assert_eq!(result.record.line_items.len(), 1);
        assert_eq!(result.record.line_items[0].amount, Some(dec("5")));
        assert_eq!(result.calculation.dpp, dec("100.00"));
        assert!(result.warnings.iter().all(|w| !w.contains("skipped")));
        assert!(result.warnings.iter().all(|w| !w.contains("could not be mapped")));
    }

    #[test]
    fn test_huge_subtotal_is_ignored() {
        let result = parse_invoice(
            r#"{"subtotal": "900000000000000000000000000"}"#,
            "price including vat",
        )
        .unwrap();
        assert_eq!(result.record.subtotal, None);
        assert_eq!(result.calculation.dpp, Decimal::ZERO);
        assert_eq!(result.record.vat, Some(Decimal::ZERO));
        assert!(result.warnings.iter().any(|w| w.starts_with("subtotal") && w.contains("not a usable amount")));

        let result = parse_invoice(r#"{"subtotal_invoice": 1e27, "vat": 1e27}"#, "").unwrap();
        assert_eq!(result.record.subtotal, None);
        assert_eq!(result.record.vat, None);
        assert!(result.warnings.iter().any(|w| w.starts_with("subtotal_invoice")));
        assert!(result.warnings.iter().any(|w| w.starts_with("vat")));
    }

    #[test]
    fn test_custom_marker() {
        let normalizer = Normalizer::new().with_inclusive_vat_marker("Harga Termasuk PPN");
        assert!(normalizer.is_vat_inclusive("harga termasuk ppn 11%"));
        assert!(!normalizer.is_vat_inclusive("price including vat"));
    }
}
