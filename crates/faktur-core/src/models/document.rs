//! Document kinds and source text.

use serde::{Deserialize, Serialize};

/// What kind of document is being extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Supplier invoice: fixed schema, VAT rule, sectioned workbook.
    #[default]
    Invoice,
    /// Shop receipt: free-form key/value extraction.
    Receipt,
    /// Curriculum vitae: free-form key/value extraction.
    Cv,
}

impl DocumentKind {
    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Receipt => "receipt",
            DocumentKind::Cv => "cv",
        }
    }

    /// Sheet name used when the result is exported as a generic dump.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Receipt => "Receipt",
            DocumentKind::Cv => "CV",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a source text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SourceOrigin {
    /// A text file, typically written by an OCR tool.
    PlainText,
    /// The embedded text layer of a PDF.
    TextPdf { pages: u32 },
    /// Text handed over directly by the caller.
    Inline,
}

/// Recognized text of one document. Opaque to the pipeline apart from the
/// VAT-inclusive marker check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceText {
    pub text: String,
    pub origin: SourceOrigin,
}

impl SourceText {
    /// Wrap text that did not come from a file.
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: SourceOrigin::Inline,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
