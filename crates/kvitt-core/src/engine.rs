//! The receipt pipeline: normalize, recognize, parse.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{KvittError, Result};
use crate::models::config::KvittConfig;
use crate::models::receipt::{DocumentKind, ExtractedDate, ExtractionResult, RawDocument};
use crate::ocr::{DecodedDocument, ImageNormalizer, NormalizedImage, RawText, TextRecognizer};
use crate::receipt::rules::DateContext;
use crate::receipt::ReceiptParser;

/// Upper bound on bottom crops tried by the secondary date pass.
pub const MAX_SECONDARY_CROPS: usize = 3;

/// Upper bound on layout modes tried per crop.
pub const MAX_SECONDARY_LAYOUTS: usize = 3;

/// Receipt extraction engine.
///
/// Holds only immutable configuration; shareable across threads when the
/// recognizer is.
pub struct ReceiptEngine<R: TextRecognizer> {
    recognizer: R,
    normalizer: ImageNormalizer,
    parser: ReceiptParser,
    config: KvittConfig,
}

impl<R: TextRecognizer> ReceiptEngine<R> {
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new(recognizer: R, config: KvittConfig) -> Result<Self> {
        config.validate()?;

        let normalizer =
            ImageNormalizer::new(config.normalize.clone()).with_pdf_config(config.pdf.clone());
        let parser = ReceiptParser::new(config.extraction.clone());

        Ok(Self {
            recognizer,
            normalizer,
            parser,
            config,
        })
    }

    pub fn config(&self) -> &KvittConfig {
        &self.config
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Extract receipt fields from a document.
    ///
    /// Fails only when the document cannot be decoded or the recognizer is
    /// unavailable for the primary pass.
    pub fn process(&self, doc: &RawDocument) -> Result<ExtractionResult> {
        let (image, orientation) = match self.normalizer.decode(doc)? {
            DecodedDocument::Raster { image, orientation } => (image, orientation),
            DecodedDocument::EmbeddedText(text) => {
                info!("Using embedded PDF text, skipping recognition");
                return Ok(self.process_text(&text));
            }
        };

        let normalized = self.normalizer.normalize_image(image, orientation)?;
        let (width, height) = normalized.dimensions();
        info!(
            "Recognizing {}x{} image with {} ({} bytes JPEG)",
            width,
            height,
            self.recognizer.name(),
            normalized.jpeg().len()
        );

        let text = self.recognizer.recognize(
            &normalized,
            &self.config.ocr.languages,
            self.config.ocr.layout_mode,
        )?;
        debug!("Recognized {} lines", text.lines.len());

        let mut result = self.parser.parse(&text);
        if result.date.is_none() && self.config.ocr.secondary_date_pass {
            let month_first = DateContext::new(&text.lower, &text.original).month_first;
            result.date = self.recover_date(&normalized, month_first);
        }

        Ok(result)
    }

    /// Extract receipt fields from already recognized text.
    pub fn process_text(&self, text: &str) -> ExtractionResult {
        self.parser.parse(&RawText::new(text))
    }

    /// Read and process a file.
    ///
    /// The kind comes from the magic bytes, then the extension; `.txt`
    /// files are treated as recognized text.
    pub fn process_path(&self, path: &Path) -> Result<ExtractionResult> {
        let bytes = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        if extension.as_deref() == Some("txt") {
            return Ok(self.process_text(&String::from_utf8_lossy(&bytes)));
        }

        let kind = DocumentKind::sniff(&bytes)
            .or_else(|| extension.as_deref().and_then(DocumentKind::from_extension))
            .ok_or_else(|| {
                KvittError::UnsupportedFormat(format!("{}: unknown document type", path.display()))
            })?;

        self.process(&RawDocument::new(bytes, kind))
    }

    /// Re-recognize bottom crops until a date turns up.
    ///
    /// At most `MAX_SECONDARY_CROPS * MAX_SECONDARY_LAYOUTS` recognizer
    /// calls. Failures are logged and skipped.
    fn recover_date(&self, image: &NormalizedImage, month_first: bool) -> Option<ExtractedDate> {
        let layouts: Vec<_> = self
            .config
            .ocr
            .secondary_layouts
            .iter()
            .take(MAX_SECONDARY_LAYOUTS)
            .copied()
            .collect();

        for &fraction in self.config.ocr.secondary_crops.iter().take(MAX_SECONDARY_CROPS) {
            let crop = match self.normalizer.crop_bottom(image, fraction) {
                Ok(crop) => crop,
                Err(e) => {
                    warn!("Could not crop bottom {:.2} of image: {}", fraction, e);
                    continue;
                }
            };

            for layout in &layouts {
                let text = match self
                    .recognizer
                    .recognize(&crop, &self.config.ocr.languages, *layout)
                {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(
                            "Secondary recognition failed (crop {:.2}, layout {:?}): {}",
                            fraction, layout, e
                        );
                        continue;
                    }
                };

                if let Some(date) = self.parser.date(&text, month_first) {
                    info!(
                        "Recovered date {} from bottom {:.2} crop (layout {:?})",
                        date, fraction, layout
                    );
                    return Some(date);
                }
                debug!("No date in crop {:.2} with layout {:?}", fraction, layout);
            }
        }

        None
    }
}
