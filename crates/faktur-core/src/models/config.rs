//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::FakturError;
use crate::flatten::DEFAULT_MAX_DEPTH;
use crate::invoice::DEFAULT_INCLUSIVE_VAT_MARKER;
use crate::invoice::vat::DEFAULT_VAT_RATE_PERCENT;
use crate::models::invoice::DEFAULT_CURRENCY;

/// Main configuration for faktur.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FakturConfig {
    /// Language-model collaborator.
    pub llm: LlmConfig,

    /// Normalization and flattening.
    pub extraction: ExtractionConfig,

    /// PDF text loading.
    pub pdf: PdfConfig,

    /// Spreadsheet output.
    pub export: ExportConfig,
}

/// Chat-completion endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL (without `/chat/completions`).
    pub base_url: String,

    /// Model name sent with every request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// API key stored in the config file. Takes precedence over the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Source text is cut to this many characters before prompting.
    pub max_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 120,
            max_input_chars: 12_000,
        }
    }
}

impl LlmConfig {
    /// API key from the config file or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Currency used when the document has none.
    pub default_currency: String,

    /// Phrase in the source text that marks prices as VAT-inclusive.
    pub inclusive_vat_marker: String,

    /// VAT rate in whole percent.
    pub vat_rate_percent: u32,

    /// Maximum nesting accepted by the flattener.
    pub max_flatten_depth: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            inclusive_vat_marker: DEFAULT_INCLUSIVE_VAT_MARKER.to_string(),
            vat_rate_percent: DEFAULT_VAT_RATE_PERCENT,
            max_flatten_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length to consider the PDF text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            min_text_length: 50,
        }
    }
}

/// Spreadsheet output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sheet name of the sectioned invoice workbook.
    pub invoice_sheet: String,

    /// Sheet name of generic key/value workbooks.
    pub generic_sheet: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            invoice_sheet: "Invoice".to_string(),
            generic_sheet: "Data".to_string(),
        }
    }
}

impl FakturConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), FakturError> {
        if self.llm.base_url.trim().is_empty() {
            return Err(FakturError::Config("llm.base_url is empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(FakturError::Config("llm.model is empty".to_string()));
        }
        if self.llm.max_input_chars == 0 {
            return Err(FakturError::Config("llm.max_input_chars must be positive".to_string()));
        }
        if self.extraction.max_flatten_depth == 0 {
            return Err(FakturError::Config(
                "extraction.max_flatten_depth must be positive".to_string(),
            ));
        }
        if self.extraction.default_currency.trim().is_empty() {
            return Err(FakturError::Config(
                "extraction.default_currency is empty".to_string(),
            ));
        }
        for (key, name) in [
            ("export.invoice_sheet", &self.export.invoice_sheet),
            ("export.generic_sheet", &self.export.generic_sheet),
        ] {
            if name.is_empty() || name.chars().count() > 31 {
                return Err(FakturError::Config(format!(
                    "{} must be 1-31 characters",
                    key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FakturConfig::default();
        assert_eq!(config.extraction.default_currency, "IDR");
        assert_eq!(config.extraction.vat_rate_percent, 11);
        assert_eq!(config.extraction.inclusive_vat_marker, "price including vat");
        assert_eq!(config.export.invoice_sheet, "Invoice");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: FakturConfig =
            serde_json::from_str(r#"{"llm": {"model": "gpt-4"}, "extraction": {"vat_rate_percent": 12}}"#)
                .unwrap();
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.extraction.vat_rate_percent, 12);
        assert_eq!(config.extraction.default_currency, "IDR");
    }

    #[test]
    fn test_negative_rate_rejected() {
        let parsed: Result<FakturConfig, _> =
            serde_json::from_str(r#"{"extraction": {"vat_rate_percent": -11}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_rejects_long_sheet_name() {
        let mut config = FakturConfig::default();
        config.export.generic_sheet = "x".repeat(40);
        assert!(matches!(config.validate(), Err(FakturError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FakturConfig::default();
        config.llm.model = "gpt-4".to_string();
        config.save(&path).unwrap();

        let loaded = FakturConfig::from_file(&path).unwrap();
        assert_eq!(loaded.llm.model, "gpt-4");
        assert_eq!(loaded.pdf.max_pages, 10);
    }

    #[test]
    fn test_inline_api_key_wins() {
        let config = LlmConfig {
            api_key: Some("  sk-inline ".to_string()),
            api_key_env: "FAKTUR_TEST_UNSET_VARIABLE".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-inline"));

        let config = LlmConfig {
            api_key: None,
            api_key_env: "FAKTUR_TEST_UNSET_VARIABLE".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key(), None);
    }
}
