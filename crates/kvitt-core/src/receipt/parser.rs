//! Combines the field extractors into one receipt record.

use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::receipt::{
    CurrencyCode, ExtractedAmount, ExtractedDate, ExtractionResult, YearRange,
};
use crate::ocr::RawText;

use super::rules::amounts::extract_amount_match;
use super::rules::dates::extract_date_match;
use super::rules::{
    detect_currency, extract_merchant, extract_subtotal, extract_tax, AmountContext, DateContext,
    AMOUNT_OVERRIDES,
};

/// Rule-based receipt parser.
///
/// Pure over its input: the same text always yields the same result.
#[derive(Debug, Clone, Default)]
pub struct ReceiptParser {
    config: ExtractionConfig,
}

impl ReceiptParser {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn year_range(&self) -> YearRange {
        YearRange {
            min: self.config.min_year,
            max: self.config.max_year,
        }
    }

    /// Extract all fields from recognized text. Missing fields are `None`.
    pub fn parse(&self, text: &RawText) -> ExtractionResult {
        let currency = detect_currency(&text.lower);
        let amount = self.amount(text, currency);
        let date = self.date(text, false);
        let merchant = extract_merchant(&text.lines);
        let subtotal = extract_subtotal(&text.lines);
        let tax = extract_tax(&text.lines);

        let result = ExtractionResult {
            amount,
            currency,
            date,
            merchant,
            subtotal,
            tax,
            diagnostic_text: text.clone(),
        };

        info!(
            "Parsed receipt: amount={:?} currency={:?} date={:?} merchant={:?}",
            result.amount.map(|a| a.to_string()),
            result.currency,
            result.date.map(|d| d.to_string()),
            result.merchant
        );
        result
    }

    /// Date only, for re-recognized crops.
    ///
    /// `month_first_hint` carries a US-locale signal found in the full text,
    /// which a bottom crop usually no longer contains.
    pub fn date(&self, text: &RawText, month_first_hint: bool) -> Option<ExtractedDate> {
        let ctx = DateContext::new(&text.lower, &text.original);
        let ctx = ctx.with_month_first(ctx.month_first || month_first_hint);
        extract_date_match(&ctx, self.year_range()).map(|m| m.value)
    }

    fn amount(&self, text: &RawText, currency: Option<CurrencyCode>) -> Option<ExtractedAmount> {
        let ctx = AmountContext::new(&text.lower, &text.lines, currency, &text.original)
            .with_tail_lines(self.config.tail_lines);

        let generic = extract_amount_match(&ctx);
        let mut amount = generic.as_ref().map(|m| m.value);

        for rule in AMOUNT_OVERRIDES {
            let Some(value) = (rule.run)(&ctx) else {
                continue;
            };
            let value = ExtractedAmount::new(value);
            let differs = match amount {
                Some(current) => (current.value() - value.value()).abs() > self.config.override_tolerance,
                None => true,
            };
            if differs {
                info!(
                    "Amount override {} replaced {:?} with {}",
                    rule.name,
                    amount.map(|a| a.to_string()),
                    value
                );
                amount = Some(value);
            } else {
                debug!("Amount override {} agrees with generic result", rule.name);
            }
            break;
        }

        match amount {
            Some(a) if self.config.force_positive_amount && a.is_negative() => {
                debug!("Dropping sign of statement amount {}", a);
                Some(a.abs())
            }
            other => other,
        }
    }
}
