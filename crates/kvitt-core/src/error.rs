//! Error types for the kvitt-core library.

use thiserror::Error;

/// Main error type for the kvitt library.
///
/// Only hard failures live here. A field that could not be extracted is
/// reported as `None` on the result, never as an error.
#[derive(Error, Debug)]
pub enum KvittError {
    /// The document container is not one we can read.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The document was recognized but its content could not be decoded.
    #[error("corrupt image: {0}")]
    CorruptImage(String),

    /// The text recognition backend could not be reached or failed to run.
    #[error("text recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The external page renderer failed.
    #[error("failed to render page: {0}")]
    Render(String),
}

/// PDF failures surface as one of the two document errors.
impl From<PdfError> for KvittError {
    fn from(err: PdfError) -> Self {
        let message = err.to_string();
        match err {
            PdfError::Encrypted => KvittError::UnsupportedFormat(message),
            _ => KvittError::CorruptImage(message),
        }
    }
}

/// Result type for the kvitt library.
pub type Result<T> = std::result::Result<T, KvittError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_pdf_is_unsupported() {
        let err = KvittError::from(PdfError::Encrypted);
        assert!(matches!(err, KvittError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_broken_pdf_is_corrupt() {
        let err = KvittError::from(PdfError::NoPages);
        assert!(matches!(err, KvittError::CorruptImage(_)));
    }
}
