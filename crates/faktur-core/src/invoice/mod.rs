//! Invoice normalization: JSON recovery, lenient mapping and the VAT rule.

pub(crate) mod lenient;
mod normalizer;
mod recovery;
pub mod vat;

pub use lenient::{parse_amount, value_to_amount, value_to_text};
pub use normalizer::{
    DEFAULT_INCLUSIVE_VAT_MARKER, NormalizedInvoice, Normalizer, parse_invoice,
};
pub use recovery::parse_llm_json;
pub use vat::{VatCalculation, VatRule, calculate_dpp};
