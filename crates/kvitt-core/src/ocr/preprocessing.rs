//! Image normalization ahead of text recognition.

use std::io::{Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageError};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{KvittError, Result};
use crate::models::config::{NormalizeConfig, PdfConfig};
use crate::models::receipt::{DocumentKind, RawDocument};
use crate::pdf::{PageRenderer, PdfExtractor, PdfProcessor};

/// A decoded, orientation-corrected raster ready for the recognizer.
///
/// Owns a temporary JPEG on disk for file-based recognizers. The file is
/// removed when the value is dropped.
pub struct NormalizedImage {
    image: DynamicImage,
    jpeg: Vec<u8>,
    quality: u8,
    file: NamedTempFile,
}

impl NormalizedImage {
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Encoded JPEG bytes.
    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    /// JPEG quality actually used for `jpeg()`.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// On-disk copy of `jpeg()`, valid while `self` lives.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl std::fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("NormalizedImage")
            .field("width", &width)
            .field("height", &height)
            .field("bytes", &self.jpeg.len())
            .field("quality", &self.quality)
            .field("path", &self.file.path())
            .finish()
    }
}

/// What a document decodes to before normalization.
pub enum DecodedDocument {
    /// A raster image (photo, scan, or the image on PDF page 1).
    Raster {
        image: DynamicImage,
        /// EXIF orientation tag; 1 means upright.
        orientation: u32,
    },
    /// Embedded text of a PDF page 1 that has no usable raster. May be
    /// empty when the page could not be rasterized either.
    EmbeddedText(String),
}

/// Turns uploaded documents into bounded, upright JPEG rasters.
pub struct ImageNormalizer {
    config: NormalizeConfig,
    pdf: PdfConfig,
}

impl ImageNormalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self {
            config,
            pdf: PdfConfig::default(),
        }
    }

    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }

    /// Normalize a document into a recognizer-ready image.
    ///
    /// A PDF that decodes to embedded text has no image to normalize and
    /// fails with `CorruptImage`; use [`decode`](Self::decode) to get at
    /// that text instead.
    pub fn normalize(&self, doc: &RawDocument) -> Result<NormalizedImage> {
        match self.decode(doc)? {
            DecodedDocument::Raster { image, orientation } => {
                self.normalize_image(image, orientation)
            }
            DecodedDocument::EmbeddedText(_) => Err(KvittError::CorruptImage(
                "PDF page 1 contains no raster image".to_string(),
            )),
        }
    }

    /// Decode the document without resizing or encoding.
    pub fn decode(&self, doc: &RawDocument) -> Result<DecodedDocument> {
        match doc.kind() {
            DocumentKind::Image => {
                let image = image::load_from_memory(doc.bytes()).map_err(decode_error)?;
                let orientation = if self.config.apply_exif_orientation {
                    read_exif_orientation(doc.bytes())
                } else {
                    1
                };
                Ok(DecodedDocument::Raster { image, orientation })
            }
            DocumentKind::Pdf => self.decode_pdf(doc.bytes()),
        }
    }

    /// Page 1 of a PDF, in order of preference: the embedded scan, enough
    /// embedded text, a `pdftoppm` rendering, whatever text there is.
    fn decode_pdf(&self, bytes: &[u8]) -> Result<DecodedDocument> {
        let mut pdf = PdfExtractor::new();
        pdf.load(bytes)?;

        if let Some(image) = pdf.render_first_page()? {
            debug!("Using embedded raster of PDF page 1");
            return Ok(DecodedDocument::Raster {
                image,
                orientation: 1,
            });
        }

        let text = if self.pdf.use_embedded_text {
            pdf.extract_page_text(1).unwrap_or_default()
        } else {
            String::new()
        };
        if text.trim().len() >= self.pdf.min_text_length {
            info!("PDF page 1 has no raster image, using {} chars of embedded text", text.len());
            return Ok(DecodedDocument::EmbeddedText(text));
        }

        let renderer = PageRenderer::new(self.pdf.pdftoppm_path.clone());
        match renderer.render_page(bytes, 1, self.pdf.render_dpi) {
            Ok(Some(image)) => {
                info!("Rasterized PDF page 1 at {} dpi", self.pdf.render_dpi);
                return Ok(DecodedDocument::Raster {
                    image,
                    orientation: 1,
                });
            }
            Ok(None) => {}
            Err(e) => warn!("Rasterizing PDF page 1 failed: {}", e),
        }

        warn!(
            "PDF page 1 could not be rasterized, falling back to {} chars of embedded text",
            text.trim().len()
        );
        Ok(DecodedDocument::EmbeddedText(text))
    }

    /// Orient, convert, bound and encode an already decoded image.
    pub fn normalize_image(&self, image: DynamicImage, orientation: u32) -> Result<NormalizedImage> {
        let (orig_width, orig_height) = image.dimensions();
        if orig_width == 0 || orig_height == 0 {
            return Err(KvittError::CorruptImage("image has zero size".to_string()));
        }

        // Orientation first so the bound applies to the visible width/height.
        let image = apply_orientation(image, orientation);

        let (width, height) = image.dimensions();
        let (new_width, new_height) =
            fit_within(width, height, self.config.max_dimension);
        let image = if (new_width, new_height) != (width, height) {
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            image
        };

        let image = DynamicImage::ImageRgb8(image.to_rgb8());

        debug!(
            "Normalized {}x{} (orientation {}) -> {}x{}",
            orig_width, orig_height, orientation, new_width, new_height
        );

        self.encode(image)
    }

    fn encode(&self, image: DynamicImage) -> Result<NormalizedImage> {
        let mut quality = self.config.jpeg_quality;
        let mut jpeg = encode_jpeg(&image, quality)?;

        // One retry at the reduced quality, then accept whatever we have.
        if jpeg.len() > self.config.max_bytes {
            debug!(
                "JPEG at quality {} is {} bytes (max {}), re-encoding at {}",
                quality,
                jpeg.len(),
                self.config.max_bytes,
                self.config.retry_quality
            );
            quality = self.config.retry_quality;
            jpeg = encode_jpeg(&image, quality)?;
        }

        let mut file = tempfile::Builder::new()
            .prefix("kvitt-")
            .suffix(".jpg")
            .tempfile()?;
        file.write_all(&jpeg)?;
        file.flush()?;

        Ok(NormalizedImage {
            image,
            jpeg,
            quality,
            file,
        })
    }

    /// The lower `fraction` of an image, encoded the same way.
    pub fn crop_bottom(&self, image: &NormalizedImage, fraction: f32) -> Result<NormalizedImage> {
        let (width, height) = image.dimensions();
        let fraction = fraction.clamp(0.0, 1.0);
        let crop_height = ((height as f32 * fraction).round() as u32).clamp(1, height);
        let top = height - crop_height;

        let cropped = image.image().crop_imm(0, top, width, crop_height);
        self.encode(cropped)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(NormalizeConfig::default())
    }
}

/// Scale `(width, height)` down so neither side exceeds `max`. A `max` of 0
/// leaves the size alone.
fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max_dim = width.max(height);
    if max == 0 || max_dim <= max {
        return (width, height);
    }

    let scale = max as f64 / max_dim as f64;
    let new_width = (width as f64 * scale).round() as u32;
    let new_height = (height as f64 * scale).round() as u32;

    (new_width.clamp(1, max), new_height.clamp(1, max))
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| KvittError::CorruptImage(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf)
}

fn decode_error(err: ImageError) -> KvittError {
    match err {
        ImageError::Unsupported(e) => KvittError::UnsupportedFormat(e.to_string()),
        other => KvittError::CorruptImage(other.to_string()),
    }
}

/// Read the EXIF orientation tag (0x0112) from raw image bytes.
///
/// Returns 1 (upright) when there is no EXIF data or no orientation tag.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply an EXIF orientation value.
///
/// 1 = upright, 2 = mirrored, 3 = 180, 4 = flipped, 5 = mirrored + 90 CW,
/// 6 = 90 CW, 7 = mirrored + 270 CW, 8 = 270 CW.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}
