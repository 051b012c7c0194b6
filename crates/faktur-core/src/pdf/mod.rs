//! PDF text-layer loading.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains an extractable text layer.
    Text,
    /// Scanned or empty: no usable text without OCR.
    Scanned,
}

impl PdfType {
    /// Classify extracted text by its trimmed character count.
    pub fn classify(text: &str, min_text_length: usize) -> Self {
        if text.trim().chars().count() >= min_text_length {
            PdfType::Text
        } else {
            PdfType::Scanned
        }
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from the first `max_pages` pages (0 = all).
    fn extract_text_limited(&self, max_pages: usize) -> Result<String>;
}
