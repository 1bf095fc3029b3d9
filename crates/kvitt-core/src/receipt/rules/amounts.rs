//! Total amount extraction.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::currency::{amount_tokens, CURRENCY_PRIORITY};
use super::locale::SUBTOTAL_MARKER;
use super::patterns::{
    AMOUNT_KEYWORD_LINE, NUMBER, SPACED_NUMBER, SUBTOTAL_LINE, SUMME_EUR, TAX_LINE, TOTAL_LINE,
};
use super::{ExtractionMatch, Strategy};
use crate::models::receipt::{CurrencyCode, ExtractedAmount};

/// Number of trailing non-empty lines the tail heuristic looks at.
pub const DEFAULT_TAIL_LINES: usize = 10;

/// Input shared by all amount strategies.
#[derive(Debug, Clone, Copy)]
pub struct AmountContext<'a> {
    /// Lower-cased text.
    pub lower: &'a str,
    /// Original-case lines.
    pub lines: &'a [String],
    /// Detected currency, if any.
    pub currency: Option<CurrencyCode>,
    /// Original-case text.
    pub original: &'a str,
    /// Lines scanned by `tail_max`.
    pub tail_lines: usize,
}

impl<'a> AmountContext<'a> {
    pub fn new(
        lower: &'a str,
        lines: &'a [String],
        currency: Option<CurrencyCode>,
        original: &'a str,
    ) -> Self {
        Self {
            lower,
            lines,
            currency,
            original,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }

    pub fn with_tail_lines(mut self, tail_lines: usize) -> Self {
        self.tail_lines = tail_lines;
        self
    }
}

pub type AmountRule = fn(&AmountContext<'_>) -> Option<Decimal>;

/// Generic cascade, highest precedence first.
pub const AMOUNT_STRATEGIES: &[Strategy<AmountRule>] = &[
    Strategy { name: "total_line", confidence: 0.95, run: total_line },
    Strategy { name: "negative_statement", confidence: 0.9, run: negative_statement },
    Strategy { name: "currency_tagged", confidence: 0.8, run: currency_tagged },
    Strategy { name: "keyword_line", confidence: 0.6, run: keyword_line },
    Strategy { name: "tail_max", confidence: 0.3, run: tail_max },
];

/// Locale-specific patterns that replace the generic amount when they disagree.
pub const AMOUNT_OVERRIDES: &[Strategy<AmountRule>] = &[Strategy {
    name: "german_summe_eur",
    confidence: 0.99,
    run: german_summe_eur,
}];

/// A monetary token found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberToken {
    pub value: Decimal,
    pub start: usize,
    pub end: usize,
}

/// Extract the total amount.
pub fn extract_amount(
    text_lower: &str,
    lines: &[String],
    currency: Option<CurrencyCode>,
    text_original: &str,
) -> Option<ExtractedAmount> {
    let ctx = AmountContext::new(text_lower, lines, currency, text_original);
    extract_amount_match(&ctx).map(|m| m.value)
}

/// Run the cascade and report which strategy produced the amount.
pub fn extract_amount_match(ctx: &AmountContext<'_>) -> Option<ExtractionMatch<ExtractedAmount>> {
    for strategy in AMOUNT_STRATEGIES {
        if let Some(value) = (strategy.run)(ctx) {
            debug!("Amount {} from strategy {}", value, strategy.name);
            return Some(ExtractionMatch::new(
                ExtractedAmount::new(value),
                strategy.confidence,
                strategy.name,
            ));
        }
        debug!("Amount strategy {} found nothing", strategy.name);
    }
    None
}

/// Last number on the first subtotal line.
pub fn extract_subtotal(lines: &[String]) -> Option<ExtractedAmount> {
    lines
        .iter()
        .filter(|line| SUBTOTAL_LINE.is_match(&line.to_lowercase()))
        .find_map(|line| last_number(line))
        .map(ExtractedAmount::new)
}

/// Last number on the first tax line; grand total lines are only used when
/// nothing else mentions tax.
pub fn extract_tax(lines: &[String]) -> Option<ExtractedAmount> {
    let tax_lines: Vec<(&String, bool)> = lines
        .iter()
        .filter_map(|line| {
            let lower = line.to_lowercase();
            TAX_LINE
                .is_match(&lower)
                .then(|| (line, TOTAL_LINE.is_match(&lower)))
        })
        .collect();

    tax_lines
        .iter()
        .filter(|(_, is_total)| !is_total)
        .chain(tax_lines.iter().filter(|(_, is_total)| *is_total))
        .find_map(|(line, _)| last_number(line))
        .map(ExtractedAmount::new)
}

fn total_line(ctx: &AmountContext<'_>) -> Option<Decimal> {
    ctx.lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if lower.contains(SUBTOTAL_MARKER) || !TOTAL_LINE.is_match(&lower) {
            return None;
        }
        keyword_line_number(line)
    })
}

fn negative_statement(ctx: &AmountContext<'_>) -> Option<Decimal> {
    scan_numbers(ctx.lower)
        .into_iter()
        .filter(|token| token.value.is_sign_negative())
        .find(|token| {
            let after = &ctx.lower[token.end..];
            CURRENCY_PRIORITY
                .iter()
                .flat_map(|code| amount_tokens(*code))
                .any(|tok| starts_with_token(after, tok))
        })
        .map(|token| token.value)
}

fn currency_tagged(ctx: &AmountContext<'_>) -> Option<Decimal> {
    let tokens = amount_tokens(ctx.currency?);

    scan_numbers(ctx.lower)
        .into_iter()
        .filter(|token| {
            let before = &ctx.lower[..token.start];
            let after = &ctx.lower[token.end..];
            tokens
                .iter()
                .any(|tok| ends_with_token(before, tok) || starts_with_token(after, tok))
        })
        .map(|token| token.value)
        .max()
}

fn keyword_line(ctx: &AmountContext<'_>) -> Option<Decimal> {
    ctx.lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if lower.contains(SUBTOTAL_MARKER) || !AMOUNT_KEYWORD_LINE.is_match(&lower) {
            return None;
        }
        keyword_line_number(line)
    })
}

fn tail_max(ctx: &AmountContext<'_>) -> Option<Decimal> {
    let non_empty: Vec<&str> = ctx
        .lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    let start = non_empty.len().saturating_sub(ctx.tail_lines);

    non_empty[start..]
        .iter()
        .flat_map(|line| scan_numbers(line))
        .map(|token| token.value)
        .max()
}

fn german_summe_eur(ctx: &AmountContext<'_>) -> Option<Decimal> {
    let caps = SUMME_EUR.captures(ctx.lower)?;
    parse_amount(&caps[1])
}

/// Monetary tokens in `text`, in order.
///
/// Tokens glued to further digits (dates, phone numbers, version strings)
/// or followed by `%` are skipped.
pub fn scan_numbers(text: &str) -> Vec<NumberToken> {
    scan_tokens(&NUMBER, text)
}

fn scan_tokens(pattern: &Regex, text: &str) -> Vec<NumberToken> {
    let mut tokens = Vec::new();

    for m in pattern.find_iter(text) {
        let (mut start, end) = (m.start(), m.end());
        let before = &text[..start];
        let after = &text[end..];

        let mut prev = before.chars().rev();
        let prev_char = prev.next();
        let prev_prev = prev.next();
        if prev_char.is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        if matches!(prev_char, Some('.') | Some(','))
            && prev_prev.is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        }

        let mut next = after.chars();
        let next_char = next.next();
        let next_next = next.next();
        if next_char.is_some_and(|c| c.is_ascii_digit() || c == '%') {
            continue;
        }
        if matches!(next_char, Some('.') | Some(','))
            && next_next.is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        }

        let mut raw = m.as_str();
        // "Art-12,50" is a hyphen, not a sign.
        if raw.starts_with(['-', '\u{2212}']) && prev_char.is_some_and(char::is_alphanumeric) {
            let sign_len = raw.chars().next().map(char::len_utf8).unwrap_or(0);
            raw = &raw[sign_len..];
            start += sign_len;
        }

        if let Some(value) = parse_amount(raw) {
            tokens.push(NumberToken { value, start, end });
        }
    }

    tokens
}

fn last_number(line: &str) -> Option<Decimal> {
    scan_numbers(line).last().map(|token| token.value)
}

/// Last number on a total or keyword line, where "1 234,50" is one amount.
///
/// A space-grouped token wins over the plain token it ends with.
fn keyword_line_number(line: &str) -> Option<Decimal> {
    let plain = scan_numbers(line).pop();
    let spaced = scan_tokens(&SPACED_NUMBER, line).pop();

    match (plain, spaced) {
        (Some(p), Some(s)) if s.end >= p.end => Some(s.value),
        (Some(p), _) => Some(p.value),
        (None, s) => s.map(|token| token.value),
    }
}

/// Parse an amount with `,` or `.` as decimal separator.
///
/// The last separator is the decimal one when one or two digits follow it;
/// every other separator is a thousands separator.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let negative = s.starts_with(['-', '\u{2212}']);

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match cleaned.rfind([',', '.']) {
        Some(pos) if (1..=2).contains(&(cleaned.len() - pos - 1)) => {
            let integer: String = cleaned[..pos].chars().filter(char::is_ascii_digit).collect();
            let integer = if integer.is_empty() { "0".to_string() } else { integer };
            format!("{}.{}", integer, &cleaned[pos + 1..])
        }
        _ => cleaned.chars().filter(char::is_ascii_digit).collect(),
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

fn starts_with_token(text: &str, token: &str) -> bool {
    let text = text.trim_start();
    let Some(rest) = text.strip_prefix(token) else {
        return false;
    };
    // Word tokens need a boundary after them: "eur" but not "europa".
    !token.ends_with(char::is_alphabetic) || !rest.starts_with(char::is_alphabetic)
}

fn ends_with_token(text: &str, token: &str) -> bool {
    let text = text.trim_end();
    let Some(rest) = text.strip_suffix(token) else {
        return false;
    };
    !token.starts_with(char::is_alphabetic) || !rest.ends_with(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::RawText;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn amount(text: &str, currency: Option<CurrencyCode>) -> Option<ExtractionMatch<ExtractedAmount>> {
        let raw = RawText::new(text);
        let ctx = AmountContext::new(&raw.lower, &raw.lines, currency, &raw.original);
        extract_amount_match(&ctx)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12,34"), Some(dec("12.34")));
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1'234.50"), Some(dec("1234.50")));
        assert_eq!(parse_amount("-54,00"), Some(dec("-54.00")));
        assert_eq!(parse_amount("12.5"), Some(dec("12.5")));
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_scan_numbers_skips_dates_and_percentages() {
        let values: Vec<Decimal> = scan_numbers("29.02.2023 mwst 19.00% 3,04 tel 22.33.44.55")
            .into_iter()
            .map(|t| t.value)
            .collect();
        assert_eq!(values, vec![dec("3.04")]);
    }

    #[test]
    fn test_scan_numbers_sign() {
        let tokens = scan_numbers("saldo -54,00 eur art-12,50");
        assert_eq!(tokens[0].value, dec("-54.00"));
        assert_eq!(tokens[1].value, dec("12.50"));
    }

    #[test]
    fn test_subtotal_is_excluded() {
        let m = amount("Subtotal: 10.00\nTotal: 12.50", None).unwrap();
        assert_eq!(m.value.to_string(), "12.50");
        assert_eq!(m.strategy, "total_line");
    }

    #[test]
    fn test_total_line_scenario() {
        let lines: Vec<String> = ["Subtotal 45.00", "Total EUR 54.00", "VISA ****1234"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let original = lines.join("\n");
        let lower = original.to_lowercase();

        let amount = extract_amount(&lower, &lines, Some(CurrencyCode::Eur), &original).unwrap();
        assert_eq!(amount.to_string(), "54.00");
    }

    #[test]
    fn test_last_number_on_total_line() {
        let m = amount("Total  2 Artikel  3,50  7,00", None).unwrap();
        assert_eq!(m.value.value(), dec("7.00"));
    }

    #[test]
    fn test_rounding_to_two_places() {
        let m = amount("TOTAL 12.5", None).unwrap();
        assert_eq!(m.value.to_string(), "12.50");
    }

    #[test]
    fn test_negative_statement_keeps_sign() {
        let m = amount("Kartenzahlung\nREWE MARKT -54,00 EUR\n12,00 EUR", Some(CurrencyCode::Eur)).unwrap();
        assert_eq!(m.strategy, "negative_statement");
        assert_eq!(m.value.value(), dec("-54.00"));
    }

    #[test]
    fn test_currency_tagged_takes_largest() {
        let m = amount("Bier 3,50 €\nPizza 12,90 €\n16,40 €\nDanke", Some(CurrencyCode::Eur)).unwrap();
        assert_eq!(m.strategy, "currency_tagged");
        assert_eq!(m.value.value(), dec("16.40"));
    }

    #[test]
    fn test_currency_tagged_needs_currency() {
        let m = amount("Bier 3,50 €\nPizza 12,90 €", None).unwrap();
        assert_eq!(m.strategy, "tail_max");
    }

    #[test]
    fn test_keyword_line() {
        let m = amount("Coffee 2.00\nAmount due 4.50\nChange 0.50", Some(CurrencyCode::Gbp)).unwrap();
        assert_eq!(m.strategy, "keyword_line");
        assert_eq!(m.value.value(), dec("4.50"));
    }

    #[test]
    fn test_space_grouped_totals() {
        let m = amount("Rema 1000\nTotalt 1 234,50 kr", Some(CurrencyCode::Nok)).unwrap();
        assert_eq!(m.strategy, "total_line");
        assert_eq!(m.value.to_string(), "1234.50");

        let m = amount("ICA Kvantum\nAtt betala 2 499,00 SEK", Some(CurrencyCode::Sek)).unwrap();
        assert_eq!(m.value.to_string(), "2499.00");

        let m = amount("Total\u{202f}1\u{202f}234,50 kr", Some(CurrencyCode::Nok)).unwrap();
        assert_eq!(m.value.to_string(), "1234.50");

        let m = amount("Beløp 12 345 678,00", None).unwrap();
        assert_eq!(m.strategy, "keyword_line");
        assert_eq!(m.value.to_string(), "12345678.00");
    }

    #[test]
    fn test_space_grouping_needs_three_digit_groups() {
        // Quantity column followed by a price.
        let m = amount("Total 3 12,50", None).unwrap();
        assert_eq!(m.value.to_string(), "12.50");
        // Plain spaces are not grouping outside keyword lines.
        let tokens = scan_numbers("Bong 1 234,50");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, dec("234.50"));
    }

    #[test]
    fn test_tail_max_window() {
        let mut text = String::from("Header 999.99\n");
        for i in 1..=10 {
            text.push_str(&format!("item {}.00\n", i));
        }
        let m = amount(&text, None).unwrap();
        assert_eq!(m.strategy, "tail_max");
        assert_eq!(m.value.value(), dec("10.00"));
    }

    #[test]
    fn test_no_numbers() {
        assert!(amount("Thank you\nCome again", None).is_none());
        assert!(amount("", None).is_none());
    }

    #[test]
    fn test_german_summe_eur_override_rule() {
        let raw = RawText::new("SUMME EUR 1.234,56");
        let ctx = AmountContext::new(&raw.lower, &raw.lines, None, &raw.original);
        assert_eq!(german_summe_eur(&ctx), Some(dec("1234.56")));
    }

    #[test]
    fn test_subtotal_and_tax() {
        let raw = RawText::new("Zwischensumme 45,00\nMwSt 19% 8,55\nSumme 53,55");
        assert_eq!(extract_subtotal(&raw.lines).unwrap().value(), dec("45.00"));
        assert_eq!(extract_tax(&raw.lines).unwrap().value(), dec("8.55"));

        let raw = RawText::new("Total incl. VAT 54.00\nVAT 20% 9.00");
        assert_eq!(extract_tax(&raw.lines).unwrap().value(), dec("9.00"));

        let raw = RawText::new("Total 54.00");
        assert!(extract_subtotal(&raw.lines).is_none());
        assert!(extract_tax(&raw.lines).is_none());
    }

    #[test]
    fn test_token_boundaries() {
        assert!(starts_with_token(" eur", "eur"));
        assert!(!starts_with_token(" europa", "eur"));
        assert!(starts_with_token("€ danke", "€"));
        assert!(ends_with_token("total $", "$"));
        assert!(!ends_with_token("teur", "eur"));
    }
}
