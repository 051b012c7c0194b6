//! Loading the recognized text of a document from disk.
//!
//! faktur does not run OCR. Plain-text files (as written by an OCR tool) are
//! read as-is and PDFs are accepted only when they carry a text layer.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{FakturError, PdfError, Result};
use crate::models::config::PdfConfig;
use crate::models::document::{SourceOrigin, SourceText};
use crate::pdf::{PdfExtractor, PdfProcessor, PdfType};

/// Extensions read as plain text.
pub const TEXT_EXTENSIONS: [&str; 2] = ["txt", "text"];

/// Image extensions that need an external OCR pass first.
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Whether a path has an extension [`load_source_text`] accepts.
pub fn is_supported(path: &Path) -> bool {
    let ext = extension(path);
    ext == "pdf" || TEXT_EXTENSIONS.contains(&ext.as_str())
}

/// Load the source text of one document.
pub fn load_source_text(path: &Path, config: &PdfConfig) -> Result<SourceText> {
    let ext = extension(path);
    debug!("Loading source text from {} ({})", path.display(), ext);

    match ext.as_str() {
        "pdf" => load_pdf(path, config),
        e if TEXT_EXTENSIONS.contains(&e) => {
            let text = fs::read_to_string(path)?;
            Ok(SourceText {
                text,
                origin: SourceOrigin::PlainText,
            })
        }
        e if IMAGE_EXTENSIONS.contains(&e) => Err(FakturError::UnsupportedInput(format!(
            "{} is an image; run it through OCR and pass the resulting .txt file",
            path.display()
        ))),
        _ => Err(FakturError::UnsupportedInput(format!(
            "unsupported file type '{}' for {}",
            ext,
            path.display()
        ))),
    }
}

fn load_pdf(path: &Path, config: &PdfConfig) -> Result<SourceText> {
    let data = fs::read(path)?;
    let mut extractor = PdfExtractor::new();
    extractor.load(&data)?;
    read_text_layer(&extractor, config)
}

/// Read the text layer once and reject it when it is too thin to be real.
fn read_text_layer<P: PdfProcessor>(extractor: &P, config: &PdfConfig) -> Result<SourceText> {
    let pages = extractor.page_count();
    let text = extractor.extract_text_limited(config.max_pages)?;

    let pdf_type = PdfType::classify(&text, config.min_text_length);
    debug!(chars = text.chars().count(), ?pdf_type, "Classified PDF");
    if pdf_type == PdfType::Scanned {
        return Err(PdfError::NoTextLayer(text.trim().chars().count()).into());
    }

    info!(pages, chars = text.len(), "Read PDF text layer");

    Ok(SourceText {
        text,
        origin: SourceOrigin::TextPdf { pages },
    })
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
