//! Configuration structures for the receipt pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ocr::LayoutMode;

/// Main configuration for the kvitt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KvittConfig {
    /// Image normalization configuration.
    pub normalize: NormalizeConfig,

    /// Text recognition configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Image normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Maximum pixel size of either side after downscaling.
    pub max_dimension: u32,

    /// JPEG quality for the first encode (1 - 100).
    pub jpeg_quality: u8,

    /// JPEG quality for the single re-encode when the first is too large.
    pub retry_quality: u8,

    /// Upper bound for the encoded image size in bytes.
    pub max_bytes: usize,

    /// Apply EXIF orientation before resizing.
    pub apply_exif_orientation: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1800,
            jpeg_quality: 85,
            retry_quality: 60,
            max_bytes: 1024 * 1024,
            apply_exif_orientation: true,
        }
    }
}

/// Text recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognizer language tags (Tesseract traineddata names).
    pub languages: Vec<String>,

    /// Layout mode for the primary pass. `None` leaves the engine default.
    pub layout_mode: Option<LayoutMode>,

    /// Path to the `tesseract` executable.
    pub tesseract_path: String,

    /// Enable the cropped re-recognition pass when no date was found.
    pub secondary_date_pass: bool,

    /// Bottom fractions of the image tried by the secondary pass, in order.
    pub secondary_crops: Vec<f32>,

    /// Layout modes tried on every crop, in order.
    pub secondary_layouts: Vec<Option<LayoutMode>>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: ["eng", "deu", "nor", "spa", "nld", "dan", "swe"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            layout_mode: None,
            tesseract_path: "tesseract".to_string(),
            secondary_date_pass: true,
            secondary_crops: vec![0.25, 1.0 / 3.0, 0.5],
            secondary_layouts: vec![
                None,
                Some(LayoutMode::SparseText),
                Some(LayoutMode::SingleBlock),
            ],
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Resolution used when page 1 has to be rasterized.
    pub render_dpi: u32,

    /// Path to poppler's `pdftoppm`, used for pages without an embedded image.
    pub pdftoppm_path: String,

    /// Use embedded text when page 1 carries no raster image.
    pub use_embedded_text: bool,

    /// Minimum text length to consider embedded text usable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            pdftoppm_path: "pdftoppm".to_string(),
            use_embedded_text: true,
            min_text_length: 20,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Earliest year accepted by the date validation gate.
    pub min_year: i32,

    /// Latest year accepted by the date validation gate.
    pub max_year: i32,

    /// Number of trailing non-empty lines scanned by the tail heuristic.
    pub tail_lines: usize,

    /// Difference above which a locale override replaces the generic amount.
    pub override_tolerance: Decimal,

    /// Report the final amount as non-negative.
    pub force_positive_amount: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_year: 2000,
            max_year: 2100,
            tail_lines: 10,
            override_tolerance: Decimal::new(1, 2),
            force_positive_amount: true,
        }
    }
}

impl KvittConfig {
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

    /// Check the values that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> Result<(), crate::KvittError> {
        let n = &self.normalize;
        if n.max_dimension == 0 {
            return Err(crate::KvittError::Config("normalize.max_dimension must be > 0".into()));
        }
        if !(1..=100).contains(&n.jpeg_quality) || !(1..=100).contains(&n.retry_quality) {
            return Err(crate::KvittError::Config("JPEG quality must be within 1..=100".into()));
        }
        if self.pdf.render_dpi == 0 {
            return Err(crate::KvittError::Config("pdf.render_dpi must be > 0".into()));
        }
        if self.extraction.min_year > self.extraction.max_year {
            return Err(crate::KvittError::Config(
                "extraction.min_year is after extraction.max_year".into(),
            ));
        }
        if self.ocr.secondary_crops.iter().any(|f| !(*f > 0.0 && *f <= 1.0)) {
            return Err(crate::KvittError::Config(
                "ocr.secondary_crops entries must be within (0, 1]".into(),
            ));
        }
        Ok(())
    }
}
