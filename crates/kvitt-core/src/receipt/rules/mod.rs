//! Rule-based field extractors for receipts.
//!
//! Every extractor is an ordered list of named strategies evaluated with
//! first-match-wins. The lists are plain constants so the precedence can be
//! read (and tested) in one place.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod locale;
pub mod merchant;
pub mod patterns;

pub use amounts::{
    extract_amount, extract_subtotal, extract_tax, parse_amount, AmountContext, AMOUNT_OVERRIDES,
    AMOUNT_STRATEGIES,
};
pub use currency::{detect_currency, CURRENCY_PRIORITY};
pub use dates::{extract_date, DateCandidate, DateContext, DATE_STRATEGIES};
pub use merchant::extract_merchant;

/// A named extraction rule.
#[derive(Clone, Copy)]
pub struct Strategy<F> {
    /// Stable name, used in logs and tests.
    pub name: &'static str,
    /// Confidence reported when this rule produces the value (0.0 - 1.0).
    pub confidence: f32,
    pub run: F,
}

impl<F> std::fmt::Debug for Strategy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("confidence", &self.confidence)
            .finish()
    }
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Name of the strategy that produced the value.
    pub strategy: &'static str,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, strategy: &'static str) -> Self {
        Self {
            value,
            confidence,
            strategy,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            confidence: self.confidence,
            strategy: self.strategy,
        }
    }
}
