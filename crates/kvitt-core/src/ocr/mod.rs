//! Image normalization and the text recognition boundary.

mod preprocessing;
mod recognizer;

pub use preprocessing::{
    apply_orientation, read_exif_orientation, DecodedDocument, ImageNormalizer, NormalizedImage,
};
pub use recognizer::{MockRecognizer, TesseractRecognizer, TextRecognizer};

use serde::{Deserialize, Serialize};

/// Page layout analysis setting passed to the recognizer.
///
/// The variants follow Tesseract's page segmentation modes, which is what
/// the bundled recognizer speaks; other backends map them as they see fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Fully automatic page segmentation (psm 3).
    Auto,
    /// A single column of text of variable sizes (psm 4).
    SingleColumn,
    /// A single uniform block of text (psm 6).
    SingleBlock,
    /// As much text as possible in no particular order (psm 11).
    SparseText,
    /// Sparse text with orientation and script detection (psm 12).
    SparseTextOsd,
}

impl LayoutMode {
    /// Tesseract `--psm` value.
    pub fn psm(&self) -> u8 {
        match self {
            Self::Auto => 3,
            Self::SingleColumn => 4,
            Self::SingleBlock => 6,
            Self::SparseText => 11,
            Self::SparseTextOsd => 12,
        }
    }
}

/// Recognized text of one image.
///
/// Holds the original text, a lower-cased copy for case-insensitive
/// matching, and the line-split view. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    pub original: String,
    pub lower: String,
    pub lines: Vec<String>,
}

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        let original = text.into();
        let lower = original.to_lowercase();
        let lines = original
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Self {
            original,
            lower,
            lines,
        }
    }

    /// Whether the recognizer produced nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.original.trim().is_empty()
    }

    /// Non-empty lines, trimmed.
    pub fn non_empty_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty())
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
