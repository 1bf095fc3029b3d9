//! Receipt data models shared by the extractors and the pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ocr::RawText;

/// Kind of uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A raster image (JPEG, PNG, ...).
    Image,
    /// A PDF document; only page 1 is used.
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(Self::Pdf);
        }
        image::guess_format(bytes).ok().map(|_| Self::Image)
    }

    /// Map a file extension to a document kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" | "gif" => Some(Self::Image),
            _ => None,
        }
    }
}

/// An uploaded document: opaque bytes plus their detected kind.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    kind: DocumentKind,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, kind: DocumentKind) -> Self {
        Self { bytes, kind }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// Currencies the detector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Eur,
    Usd,
    Gbp,
    Nok,
    Chf,
    Dkk,
    Sek,
    Huf,
    Aed,
}

impl CurrencyCode {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Nok => "NOK",
            Self::Chf => "CHF",
            Self::Dkk => "DKK",
            Self::Sek => "SEK",
            Self::Huf => "HUF",
            Self::Aed => "AED",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EUR" => Ok(Self::Eur),
            "USD" => Ok(Self::Usd),
            "GBP" => Ok(Self::Gbp),
            "NOK" => Ok(Self::Nok),
            "CHF" => Ok(Self::Chf),
            "DKK" => Ok(Self::Dkk),
            "SEK" => Ok(Self::Sek),
            "HUF" => Ok(Self::Huf),
            "AED" => Ok(Self::Aed),
            other => Err(format!("unknown currency: '{other}'")),
        }
    }
}

/// A monetary amount with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "Decimal", from = "Decimal")]
pub struct ExtractedAmount(Decimal);

impl ExtractedAmount {
    /// Round half away from zero to 2 dp and pin the scale at 2.
    pub fn new(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Self(rounded)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Self::new(self.0.abs())
    }
}

impl From<Decimal> for ExtractedAmount {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<ExtractedAmount> for Decimal {
    fn from(amount: ExtractedAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for ExtractedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Year range accepted by the date validation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self { min: 2000, max: 2100 }
    }
}

/// A validated calendar date (no time, no timezone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedDate(NaiveDate);

impl ExtractedDate {
    /// Validate a candidate against the default year range.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        Self::within(year, month, day, YearRange::default())
    }

    /// Validate a candidate: month range, Gregorian day-in-month bound, year range.
    pub fn within(year: i32, month: u32, day: u32, range: YearRange) -> Option<Self> {
        if year < range.min || year > range.max {
            return None;
        }
        if !(1..=12).contains(&month) {
            return None;
        }
        if day == 0 || day > days_in_month(month, year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for ExtractedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` of `year`; 0 for an invalid month.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Structured receipt fields extracted from one document.
///
/// Serializes as `{amount, currency, date, merchant, subtotal, tax}` with
/// missing values as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub amount: Option<ExtractedAmount>,
    pub currency: Option<CurrencyCode>,
    pub date: Option<ExtractedDate>,
    pub merchant: Option<String>,
    pub subtotal: Option<ExtractedAmount>,
    pub tax: Option<ExtractedAmount>,
    /// Recognized text the fields were extracted from.
    #[serde(skip)]
    pub diagnostic_text: RawText,
}

impl ExtractionResult {
    /// A result with every field absent.
    pub fn empty(diagnostic_text: RawText) -> Self {
        Self {
            amount: None,
            currency: None,
            date: None,
            merchant: None,
            subtotal: None,
            tax: None,
            diagnostic_text,
        }
    }

    /// Number of the four primary fields that were found.
    pub fn found_fields(&self) -> usize {
        [
            self.amount.is_some(),
            self.currency.is_some(),
            self.date.is_some(),
            self.merchant.is_some(),
        ]
        .iter()
        .filter(|found| **found)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_amount_always_two_decimals() {
        assert_eq!(ExtractedAmount::new(dec("12.5")).to_string(), "12.50");
        assert_eq!(ExtractedAmount::new(dec("7")).to_string(), "7.00");
        assert_eq!(ExtractedAmount::new(dec("3.14159")).to_string(), "3.14");
        assert_eq!(ExtractedAmount::new(dec("0.125")).to_string(), "0.13");
        assert_eq!(ExtractedAmount::new(dec("-54.005")).to_string(), "-54.01");
    }

    #[test]
    fn test_amount_sign() {
        assert!(ExtractedAmount::new(dec("-54.00")).is_negative());
        assert!(!ExtractedAmount::new(dec("54.00")).is_negative());
        assert!(!ExtractedAmount::new(dec("-0.00")).is_negative());
        assert_eq!(ExtractedAmount::new(dec("-54.00")).abs().to_string(), "54.00");
    }

    #[test]
    fn test_amount_serializes_with_two_decimals() {
        let json = serde_json::to_string(&ExtractedAmount::new(dec("12.5"))).unwrap();
        assert_eq!(json, "\"12.50\"");
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2000));
    }

    #[test]
    fn test_feb_29_validation() {
        assert!(ExtractedDate::new(2023, 2, 29).is_none());
        let leap = ExtractedDate::new(2024, 2, 29).unwrap();
        assert_eq!(leap.to_string(), "2024-02-29");
    }

    #[test]
    fn test_date_never_exceeds_month_length() {
        for year in [2023, 2024, 2100] {
            for month in 1..=12u32 {
                for day in 1..=31u32 {
                    let accepted = ExtractedDate::new(year, month, day).is_some();
                    assert_eq!(accepted, day <= days_in_month(month, year), "{year}-{month}-{day}");
                }
            }
        }
    }

    #[test]
    fn test_date_rejects_out_of_range() {
        assert!(ExtractedDate::new(1999, 12, 31).is_none());
        assert!(ExtractedDate::new(2101, 1, 1).is_none());
        assert!(ExtractedDate::new(2024, 13, 1).is_none());
        assert!(ExtractedDate::new(2024, 0, 1).is_none());
        assert!(ExtractedDate::new(2024, 4, 0).is_none());
        assert!(ExtractedDate::within(1995, 6, 1, YearRange { min: 1900, max: 2100 }).is_some());
    }

    #[test]
    fn test_currency_code_round_trip() {
        for code in ["EUR", "usd", "Gbp", "NOK", "CHF", "DKK", "SEK", "HUF", "AED"] {
            let parsed = CurrencyCode::from_str(code).unwrap();
            assert_eq!(parsed.code(), code.to_uppercase());
        }
        assert!(CurrencyCode::from_str("XYZ").is_err());
    }

    #[test]
    fn test_result_json_uses_null_for_missing() {
        let mut result = ExtractionResult::empty(RawText::new("Total 12.50"));
        result.amount = Some(ExtractedAmount::new(dec("12.5")));
        result.currency = Some(CurrencyCode::Eur);
        result.date = ExtractedDate::new(2025, 1, 6);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "amount": "12.50",
                "currency": "EUR",
                "date": "2025-01-06",
                "merchant": null,
                "subtotal": null,
                "tax": null,
            })
        );
    }

    #[test]
    fn test_document_kind_detection() {
        assert_eq!(DocumentKind::sniff(b"%PDF-1.7\n..."), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::sniff(b"\x89PNG\r\n\x1a\n0000"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::sniff(b"hello"), None);
        assert_eq!(DocumentKind::from_extension("JPG"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_extension("docx"), None);
    }
}
