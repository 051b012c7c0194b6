//! Error types for the faktur-core library.

use thiserror::Error;

/// Main error type for the faktur library.
#[derive(Error, Debug)]
pub enum FakturError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Extraction (normalization) error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Flattening error.
    #[error("flatten error: {0}")]
    Flatten(#[from] FlattenError),

    /// Language-model collaborator error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Spreadsheet export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file type that faktur cannot read.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The PDF carries no usable text layer; it has to go through OCR first.
    #[error("PDF has no text layer ({0} characters found); run it through OCR and pass the text file instead")]
    NoTextLayer(usize),
}

/// Errors produced while turning a language-model response into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The response is not a JSON object, even after bracket recovery.
    #[error("language model response is not valid JSON")]
    MalformedLlmResponse {
        /// The response exactly as received.
        raw: String,
    },

    /// No language-model client or credential is configured.
    #[error("no language model configured: {0}")]
    MissingCollaborator(String),

    /// The response is JSON but cannot be turned into rows.
    #[error("language model response cannot be flattened: {0}")]
    Unflattenable(#[source] FlattenError),
}

impl ExtractionError {
    /// Raw response text, when the error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ExtractionError::MalformedLlmResponse { raw } => Some(raw),
            ExtractionError::MissingCollaborator(_) | ExtractionError::Unflattenable(_) => None,
        }
    }
}

/// Errors related to flattening nested documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// Nesting exceeds the configured maximum depth.
    #[error("document nested deeper than {max_depth} levels at '{path}'")]
    TooDeeplyNested { path: String, max_depth: usize },
}

/// Errors from the chat-completion client.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered without any completion text.
    #[error("empty completion")]
    EmptyResponse,
}

/// Errors related to spreadsheet export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Workbook writer failure.
    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type for the faktur library.
pub type Result<T> = std::result::Result<T, FakturError>;
