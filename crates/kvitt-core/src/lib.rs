//! Core library for receipt field extraction.
//!
//! This crate provides:
//! - Image normalization (EXIF orientation, downscaling, JPEG re-encoding)
//! - PDF page-1 access (embedded raster or text layer)
//! - Text recognition through an external Tesseract process
//! - Rule-based extraction of amount, currency, date and merchant

pub mod engine;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod receipt;

pub use engine::ReceiptEngine;
pub use error::{KvittError, PdfError, Result};
pub use models::config::KvittConfig;
pub use models::receipt::{
    CurrencyCode, DocumentKind, ExtractedAmount, ExtractedDate, ExtractionResult, RawDocument,
    YearRange,
};
pub use ocr::{
    ImageNormalizer, LayoutMode, MockRecognizer, NormalizedImage, RawText, TesseractRecognizer,
    TextRecognizer,
};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use receipt::ReceiptParser;
