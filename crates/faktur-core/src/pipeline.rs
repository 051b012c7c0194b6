//! One document in, one structured result out.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};
use crate::flatten::{FlatRow, Flattener};
use crate::invoice::{NormalizedInvoice, Normalizer, parse_llm_json};
use crate::llm::{CompletionBackend, OpenAiClient, Prompt, truncate_chars};
use crate::models::config::FakturConfig;
use crate::models::document::{DocumentKind, SourceText};

/// What the pipeline made of the model's answer.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A normalized invoice.
    Invoice(NormalizedInvoice),
    /// A free-form document flattened to key/value rows.
    Structured { value: Value, rows: Vec<FlatRow> },
    /// The answer held no usable JSON object, or one too deep to flatten.
    Unparsed(ExtractionError),
}

/// Result of processing one document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub kind: DocumentKind,
    /// The model's answer, verbatim.
    pub llm_response: String,
    pub outcome: Outcome,
    /// Wall-clock time spent, in milliseconds.
    pub processing_time_ms: u64,
}

impl DocumentResult {
    pub fn invoice(&self) -> Option<&NormalizedInvoice> {
        match &self.outcome {
            Outcome::Invoice(invoice) => Some(invoice),
            _ => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        !matches!(self.outcome, Outcome::Unparsed(_))
    }

    /// Serializable view for JSON output.
    pub fn to_json(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct View<'a> {
            kind: DocumentKind,
            status: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            invoice: Option<&'a NormalizedInvoice>,
            #[serde(skip_serializing_if = "Option::is_none")]
            data: Option<&'a Value>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            raw_response: Option<&'a str>,
            processing_time_ms: u64,
        }

        let view = match &self.outcome {
            Outcome::Invoice(invoice) => View {
                kind: self.kind,
                status: "ok",
                invoice: Some(invoice),
                data: None,
                error: None,
                raw_response: None,
                processing_time_ms: self.processing_time_ms,
            },
            Outcome::Structured { value, .. } => View {
                kind: self.kind,
                status: "ok",
                invoice: None,
                data: Some(value),
                error: None,
                raw_response: None,
                processing_time_ms: self.processing_time_ms,
            },
            Outcome::Unparsed(err) => View {
                kind: self.kind,
                status: "unparsed",
                invoice: None,
                data: None,
                error: Some(err.to_string()),
                raw_response: Some(&self.llm_response),
                processing_time_ms: self.processing_time_ms,
            },
        };

        Ok(serde_json::to_value(view)?)
    }
}

/// Prompt, completion and normalization for single documents.
///
/// Built once and reused; holds no per-document state.
pub struct DocumentPipeline<B: CompletionBackend> {
    backend: B,
    normalizer: Normalizer,
    flattener: Flattener,
    max_input_chars: usize,
}

impl<B: CompletionBackend> DocumentPipeline<B> {
    pub fn new(backend: B, normalizer: Normalizer, flattener: Flattener) -> Self {
        Self {
            backend,
            normalizer,
            flattener,
            max_input_chars: usize::MAX,
        }
    }

    /// Cut source text to this many characters before prompting.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn flattener(&self) -> &Flattener {
        &self.flattener
    }

    /// Process one document.
    ///
    /// Transport failures are errors. A response that cannot be read as JSON
    /// is not: it comes back as [`Outcome::Unparsed`] with the raw text kept.
    pub fn process(&self, kind: DocumentKind, source: &SourceText) -> Result<DocumentResult> {
        let start = Instant::now();

        if source.is_blank() {
            warn!("Source text for {} is blank", kind);
        }

        let text = truncate_chars(&source.text, self.max_input_chars);
        if text.len() < source.text.len() {
            debug!(
                "Source text cut from {} to {} characters",
                source.text.chars().count(),
                self.max_input_chars
            );
        }

        let prompt = Prompt::for_document(kind, text);
        info!("Requesting {} extraction from {}", kind, self.backend.describe());
        let llm_response = self.backend.complete(prompt.system, &prompt.user)?;
        debug!("Model answered with {} characters", llm_response.len());

        let outcome = match kind {
            // The marker is searched in the full text, not the truncated prompt.
            DocumentKind::Invoice => match self.normalizer.parse(&llm_response, &source.text) {
                Ok(invoice) => Outcome::Invoice(invoice),
                Err(err) => Outcome::Unparsed(err),
            },
            DocumentKind::Receipt | DocumentKind::Cv => match parse_llm_json(&llm_response) {
                Ok(map) => {
                    let value = Value::Object(map);
                    match self.flattener.flatten(&value, "") {
                        Ok(rows) => Outcome::Structured { value, rows },
                        Err(err) => Outcome::Unparsed(ExtractionError::Unflattenable(err)),
                    }
                }
                Err(err) => Outcome::Unparsed(err),
            },
        };

        if let Outcome::Unparsed(err) = &outcome {
            warn!("Could not use the {} response: {}", kind, err);
        }

        Ok(DocumentResult {
            kind,
            llm_response,
            outcome,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl DocumentPipeline<OpenAiClient> {
    /// Build the pipeline around an OpenAI-compatible endpoint.
    pub fn from_config(config: &FakturConfig) -> Result<Self> {
        config.validate()?;
        let client = OpenAiClient::from_config(&config.llm)?;

        Ok(Self::new(
            client,
            Normalizer::from_config(&config.extraction),
            Flattener::new().with_max_depth(config.extraction.max_flatten_depth),
        )
        .with_max_input_chars(config.llm.max_input_chars))
    }
}
