//! Merchant name extraction.

/// First non-empty line, trimmed.
///
/// Receipts print the shop name in the header, but OCR noise often lands
/// there too, so callers treat this as a hint only.
pub fn extract_merchant(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
