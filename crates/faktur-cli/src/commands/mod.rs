//! Subcommands.

pub mod batch;
pub mod config;
pub mod flatten;
pub mod normalize;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use faktur_core::models::config::FakturConfig;
use faktur_core::models::document::DocumentKind;
use tracing::debug;

/// `<config_dir>/faktur/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faktur")
        .join("config.json")
}

/// Load the configuration from `--config`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FakturConfig> {
    let config = match config_path {
        Some(path) => FakturConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Using config at {}", path.display());
                FakturConfig::from_file(&path)?
            } else {
                FakturConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Document kind as accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum KindArg {
    /// Supplier invoice (fixed schema, VAT rule)
    Invoice,
    /// Shop receipt (free-form key/value)
    Receipt,
    /// Curriculum vitae (free-form key/value)
    Cv,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Invoice => DocumentKind::Invoice,
            KindArg::Receipt => DocumentKind::Receipt,
            KindArg::Cv => DocumentKind::Cv,
        }
    }
}
