//! PDF page-1 access.
//!
//! Receipts arrive as single-page scans or exports, so only the first page
//! is ever looked at.

mod extractor;
mod render;

pub use extractor::PdfExtractor;
pub use render::PageRenderer;

#[cfg(test)]
pub(crate) use extractor::tests::{build_pdf, small_jpeg};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Embedded raster images of a page, in resource order.
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// The raster standing in for page 1, if the page has one.
    fn render_first_page(&self) -> Result<Option<DynamicImage>>;
}
