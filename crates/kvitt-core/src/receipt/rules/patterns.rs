//! Common regex patterns for receipt extraction.
//!
//! Everything here matches against the lower-cased text unless noted.

use lazy_static::lazy_static;
use regex::Regex;

use super::locale::{
    alternation, month_alternation, AMOUNT_KEYWORDS, DATE_KEYWORDS, PAYMENT_PHRASES, SUBTOTAL_KEYWORDS, TAX_KEYWORDS,
    TOTAL_KEYWORDS, TOTAL_WORDS,
};

lazy_static! {
    // Monetary token: optional sign, optional thousands grouping, 1-2 decimals.
    // Boundaries are checked by the scanner (the regex crate has no lookaround).
    pub static ref NUMBER: Regex = Regex::new(
        r"[-\u{2212}]?(?:\d{1,3}(?:[.,'\u{a0}\u{202f}]\d{3})+[.,]\d{2}|\d+[.,]\d{1,2})"
    ).unwrap();

    // "1 234,50": plain-space grouping, only trusted on keyword lines.
    pub static ref SPACED_NUMBER: Regex = Regex::new(
        r"[-\u{2212}]?\d{1,3}(?: \d{3})+[.,]\d{2}"
    ).unwrap();

    // Line classifiers
    pub static ref TOTAL_LINE: Regex = Regex::new(&format!(
        r"\b(?:{})|\b(?:{})\b",
        alternation(TOTAL_KEYWORDS),
        alternation(TOTAL_WORDS)
    )).unwrap();

    pub static ref AMOUNT_KEYWORD_LINE: Regex = Regex::new(&format!(
        r"\b(?:{})",
        alternation(AMOUNT_KEYWORDS)
    )).unwrap();

    pub static ref SUBTOTAL_LINE: Regex = Regex::new(&format!(
        r"(?:{})",
        alternation(SUBTOTAL_KEYWORDS)
    )).unwrap();

    pub static ref TAX_LINE: Regex = Regex::new(&format!(
        r"\b(?:{})\b",
        alternation(TAX_KEYWORDS)
    )).unwrap();

    // German receipts: "SUMME EUR 12,34" / "Summe € 12,34"
    pub static ref SUMME_EUR: Regex = Regex::new(
        r"\bsumme\s*(?:eur|€)\s*:?\s*([-\u{2212}]?\d{1,3}(?:\.\d{3})*,\d{2}|[-\u{2212}]?\d+[.,]\d{2})"
    ).unwrap();

    // "date paid: January 6, 2025", "paid on 6 Jan 2025", "betalt 6. januar 2025"
    pub static ref PAYMENT_DATE: Regex = Regex::new(&format!(
        r"(?:{phrases})[\s:.\-]*(?:on\s+)?(?:\b({months})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})|(\d{{1,2}})(?:st|nd|rd|th)?\.?\s+(?:of\s+)?({months})\.?,?\s+(\d{{4}}))",
        phrases = alternation(PAYMENT_PHRASES),
        months = month_alternation()
    )).unwrap();

    // "Datum: 29.02.2023", "Dato 03/04/24"
    pub static ref KEYWORD_NUMERIC_DATE: Regex = Regex::new(&format!(
        r"(?:{})[^\d\n]{{0,12}}?\b(\d{{1,2}})([./\-])(\d{{1,2}})([./\-])(\d{{4}}|\d{{2}})\b",
        alternation(DATE_KEYWORDS)
    )).unwrap();

    // "6 January 2025", "6. Jan. 25", "06-jan-2025", "6 de enero de 2025"
    // Month groups only accept words from the locale table.
    pub static ref DAY_MONTH_NAME: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\.?[\s\-/]*(?:(?:of|de)\s+)?({})\.?[\s,\-/]+(?:de\s+)?(\d{{4}}|\d{{2}})\b",
        month_alternation()
    )).unwrap();

    // "January 6, 2025", "Jan 6 2025"
    pub static ref MONTH_NAME_DAY: Regex = Regex::new(&format!(
        r"\b({})\.?[\s\-]+(\d{{1,2}})(?:st|nd|rd|th)?,?[\s\-]+(\d{{4}})\b",
        month_alternation()
    )).unwrap();

    // 2024-02-29, 29.02.2024, 02/29/24; both separators must agree (checked in code)
    pub static ref NUMERIC_DATE: Regex = Regex::new(
        r"\b(\d{1,4})([./\-])(\d{1,2})([./\-])(\d{2,4})\b"
    ).unwrap();

    // Case-sensitive, against the original text.
    pub static ref US_LOCALE: Regex = Regex::new(r"\bUSA?\b|US\$").unwrap();
}
