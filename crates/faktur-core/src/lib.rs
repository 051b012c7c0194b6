//! Core library for LLM-assisted document extraction.
//!
//! This crate provides:
//! - Source text loading (OCR output files, text-layer PDFs)
//! - Prompting an OpenAI-compatible model for structured JSON
//! - Invoice normalization with the Indonesian 11% VAT (PPN) rule
//! - Flattening of nested JSON into key/value rows
//! - Excel export of invoices and flattened documents

pub mod error;
pub mod export;
pub mod flatten;
pub mod invoice;
pub mod llm;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod source;

pub use error::{ExtractionError, FakturError, Result};
pub use flatten::{FlatRow, FlatTable, Flattener, flatten};
pub use invoice::{NormalizedInvoice, Normalizer, VatCalculation, VatRule, calculate_dpp, parse_invoice};
pub use llm::{CompletionBackend, OpenAiClient};
pub use models::config::FakturConfig;
pub use models::document::{DocumentKind, SourceText};
pub use models::invoice::{BankDetails, InvoiceMeta, InvoiceRecord, LineItem, Party};
pub use pipeline::{DocumentPipeline, DocumentResult, Outcome};
pub use source::load_source_text;
