//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use kvitt_core::{KvittConfig, ReceiptEngine, TesseractRecognizer};

/// Extensions picked up by `batch` and accepted by `process`.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp", "gif", "txt",
];

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kvitt")
        .join("config.json")
}

/// Explicit `--config` path, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KvittConfig> {
    if let Some(path) = config_path {
        return Ok(KvittConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(KvittConfig::from_file(&default_path)?)
    } else {
        Ok(KvittConfig::default())
    }
}

pub fn build_engine(config: KvittConfig) -> anyhow::Result<ReceiptEngine<TesseractRecognizer>> {
    let recognizer = TesseractRecognizer::new(config.ocr.tesseract_path.clone());
    if !recognizer.is_available() {
        warn!(
            "tesseract not found at '{}'; only text inputs can be processed",
            config.ocr.tesseract_path
        );
    }
    Ok(ReceiptEngine::new(recognizer, config)?)
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
