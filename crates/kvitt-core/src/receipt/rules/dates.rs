//! Transaction date extraction.

use tracing::debug;

use super::currency::detect_currency;
use super::locale::month_number;
use super::patterns::{
    DAY_MONTH_NAME, KEYWORD_NUMERIC_DATE, MONTH_NAME_DAY, NUMERIC_DATE, PAYMENT_DATE, US_LOCALE,
};
use super::{ExtractionMatch, Strategy};
use crate::models::receipt::{CurrencyCode, ExtractedDate, YearRange};

/// Input shared by all date strategies.
#[derive(Debug, Clone, Copy)]
pub struct DateContext<'a> {
    /// Lower-cased text.
    pub lower: &'a str,
    /// Original-case text.
    pub original: &'a str,
    /// Read ambiguous numeric dates as month/day/year.
    pub month_first: bool,
}

impl<'a> DateContext<'a> {
    /// Build a context, deriving the US-locale signal from the text itself.
    pub fn new(lower: &'a str, original: &'a str) -> Self {
        let month_first =
            detect_currency(lower) == Some(CurrencyCode::Usd) || US_LOCALE.is_match(original);
        Self {
            lower,
            original,
            month_first,
        }
    }

    pub fn with_month_first(mut self, month_first: bool) -> Self {
        self.month_first = month_first;
        self
    }
}

/// An unvalidated (year, month, day) reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCandidate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateCandidate {
    fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

pub type DateRule = fn(&DateContext<'_>) -> Vec<DateCandidate>;

/// Date cascade, highest precedence first. Each rule yields candidates in
/// document order.
pub const DATE_STRATEGIES: &[Strategy<DateRule>] = &[
    Strategy { name: "payment_phrase", confidence: 0.95, run: payment_phrase },
    Strategy { name: "locale_keyword_numeric", confidence: 0.9, run: locale_keyword_numeric },
    Strategy { name: "month_name", confidence: 0.8, run: month_name },
    Strategy { name: "bare_numeric", confidence: 0.6, run: bare_numeric },
];

/// Extract the transaction date using the default year range.
pub fn extract_date(text_lower: &str, text_original: &str) -> Option<ExtractedDate> {
    let ctx = DateContext::new(text_lower, text_original);
    extract_date_match(&ctx, YearRange::default()).map(|m| m.value)
}

/// Run the cascade; every candidate must pass calendar validation.
pub fn extract_date_match(
    ctx: &DateContext<'_>,
    range: YearRange,
) -> Option<ExtractionMatch<ExtractedDate>> {
    for strategy in DATE_STRATEGIES {
        for candidate in (strategy.run)(ctx) {
            match ExtractedDate::within(candidate.year, candidate.month, candidate.day, range) {
                Some(date) => {
                    debug!("Date {} from strategy {}", date, strategy.name);
                    return Some(ExtractionMatch::new(date, strategy.confidence, strategy.name));
                }
                None => debug!(
                    "Strategy {} candidate {:04}-{:02}-{:02} failed validation",
                    strategy.name, candidate.year, candidate.month, candidate.day
                ),
            }
        }
    }
    None
}

/// Expand a 2- or 4-digit year; two digits always mean 20YY.
pub fn expand_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

fn candidate(year: &str, month: u32, day: &str) -> Option<DateCandidate> {
    Some(DateCandidate::new(expand_year(year)?, month, day.parse().ok()?))
}

fn payment_phrase(ctx: &DateContext<'_>) -> Vec<DateCandidate> {
    PAYMENT_DATE
        .captures_iter(ctx.lower)
        .filter_map(|caps| {
            if let (Some(month), Some(day), Some(year)) = (caps.get(1), caps.get(2), caps.get(3)) {
                return candidate(year.as_str(), month_number(month.as_str())?, day.as_str());
            }
            let (day, month, year) = (caps.get(4)?, caps.get(5)?, caps.get(6)?);
            candidate(year.as_str(), month_number(month.as_str())?, day.as_str())
        })
        .collect()
}

fn locale_keyword_numeric(ctx: &DateContext<'_>) -> Vec<DateCandidate> {
    KEYWORD_NUMERIC_DATE
        .captures_iter(ctx.lower)
        .filter(|caps| caps[2] == caps[4])
        .filter_map(|caps| candidate(&caps[5], caps[3].parse().ok()?, &caps[1]))
        .collect()
}

fn month_name(ctx: &DateContext<'_>) -> Vec<DateCandidate> {
    let day_first = DAY_MONTH_NAME.captures_iter(ctx.lower).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let month = month_number(&caps[2])?;
        Some((start, candidate(&caps[3], month, &caps[1])?))
    });
    let month_first = MONTH_NAME_DAY.captures_iter(ctx.lower).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let month = month_number(&caps[1])?;
        Some((start, candidate(&caps[3], month, &caps[2])?))
    });

    let mut found: Vec<(usize, DateCandidate)> = day_first.chain(month_first).collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, c)| c).collect()
}

fn bare_numeric(ctx: &DateContext<'_>) -> Vec<DateCandidate> {
    let mut candidates = Vec::new();

    for caps in NUMERIC_DATE.captures_iter(ctx.lower) {
        if caps[2] != caps[4] {
            continue;
        }
        let (a, b, c) = (&caps[1], &caps[3], &caps[5]);
        let (Ok(first), Ok(second)) = (a.parse::<u32>(), b.parse::<u32>()) else {
            continue;
        };

        if a.len() == 4 {
            // YYYY-MM-DD
            if c.len() <= 2 {
                if let Ok(day) = c.parse() {
                    candidates.push(DateCandidate::new(first as i32, second, day));
                }
            }
            continue;
        }

        if a.len() > 2 {
            continue;
        }
        let Some(year) = expand_year(c) else {
            continue;
        };

        let (month, day) = if ctx.month_first {
            (first, second)
        } else {
            (second, first)
        };
        candidates.push(DateCandidate::new(year, month, day));
        // "13/05/2024" on a US receipt can only be day-first.
        if month > 12 && day <= 12 {
            candidates.push(DateCandidate::new(year, day, month));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::RawText;

    fn date(text: &str) -> Option<String> {
        let raw = RawText::new(text);
        extract_date(&raw.lower, &raw.original).map(|d| d.to_string())
    }

    fn date_match(text: &str) -> Option<ExtractionMatch<ExtractedDate>> {
        let raw = RawText::new(text);
        extract_date_match(&DateContext::new(&raw.lower, &raw.original), YearRange::default())
    }

    #[test]
    fn test_payment_phrase() {
        let m = date_match("Receipt #1042\nDate paid\nJanuary 6, 2025\nTotal $12.00").unwrap();
        assert_eq!(m.value.to_string(), "2025-01-06");
        assert_eq!(m.strategy, "payment_phrase");

        assert_eq!(date("Paid on 6th March 2024").as_deref(), Some("2024-03-06"));
        assert_eq!(date("Betalt 3. desember 2024").as_deref(), Some("2024-12-03"));
    }

    #[test]
    fn test_payment_phrase_outranks_earlier_dates() {
        let text = "Invoice date 01.12.2024\nDate paid: February 3, 2025";
        assert_eq!(date(text).as_deref(), Some("2025-02-03"));
    }

    #[test]
    fn test_keyword_numeric_is_day_first() {
        let m = date_match("Datum: 05.04.2024 14:32").unwrap();
        assert_eq!(m.value.to_string(), "2024-04-05");
        assert_eq!(m.strategy, "locale_keyword_numeric");

        assert_eq!(date("Dato 03/04/24").as_deref(), Some("2024-04-03"));
    }

    #[test]
    fn test_invalid_leap_day_is_rejected() {
        assert_eq!(date("Datum: 29.02.2023"), None);
        assert_eq!(date("Datum: 29.02.2024").as_deref(), Some("2024-02-29"));
        assert_eq!(date("2024-02-29").as_deref(), Some("2024-02-29"));
        assert_eq!(date("2023-02-29"), None);
    }

    #[test]
    fn test_failed_candidate_continues_cascade() {
        // Keyword reading is invalid, the month-name line still counts.
        let text = "Datum: 31.04.2024\nKasse 3  12. März 2024";
        let m = date_match(text).unwrap();
        assert_eq!(m.strategy, "month_name");
        assert_eq!(m.value.to_string(), "2024-03-12");
    }

    #[test]
    fn test_month_name_orders() {
        assert_eq!(date("Kvittering 14 mai 2024").as_deref(), Some("2024-05-14"));
        assert_eq!(date("Oct 2, 2023 10:15").as_deref(), Some("2023-10-02"));
        assert_eq!(date("le 7 août 2024").as_deref(), Some("2024-08-07"));
        assert_eq!(date("12 de diciembre de 2024").as_deref(), Some("2024-12-12"));
        assert_eq!(date("3 mrt 24").as_deref(), Some("2024-03-03"));
    }

    #[test]
    fn test_number_word_number_before_month_name_date() {
        assert_eq!(date("Tisch 4 Kellner 12 März 2024").as_deref(), Some("2024-03-12"));
        assert_eq!(date("Kasse 2 Bon 12 März 2024").as_deref(), Some("2024-03-12"));
        assert_eq!(date("Bord 7 Kvittering 3 mai 2024").as_deref(), Some("2024-05-03"));
        assert_eq!(date("Kellner 12 Tisch 2024"), None);
    }

    #[test]
    fn test_bare_numeric_day_first_by_default() {
        assert_eq!(date("Bon 03/04/2024 Kasse 2").as_deref(), Some("2024-04-03"));
        assert_eq!(date("14.03.24").as_deref(), Some("2024-03-14"));
    }

    #[test]
    fn test_bare_numeric_us_locale() {
        assert_eq!(date("WALMART USA\n03/04/2024").as_deref(), Some("2024-03-04"));
        assert_eq!(date("Total $5.00\n12/31/2024").as_deref(), Some("2024-12-31"));
        // Unambiguous day-first reading survives the US signal.
        assert_eq!(date("USA 13/05/2024").as_deref(), Some("2024-05-13"));
    }

    #[test]
    fn test_mixed_separators_are_not_dates() {
        assert_eq!(date("Ref 12.05/2024"), None);
    }

    #[test]
    fn test_year_range() {
        assert_eq!(date("Datum: 01.01.1999"), None);
        let raw = RawText::new("Datum: 01.01.1999");
        let wide = YearRange { min: 1990, max: 2100 };
        let m = extract_date_match(&DateContext::new(&raw.lower, &raw.original), wide).unwrap();
        assert_eq!(m.value.to_string(), "1999-01-01");
    }

    #[test]
    fn test_expand_year() {
        assert_eq!(expand_year("24"), Some(2024));
        assert_eq!(expand_year("2031"), Some(2031));
        assert_eq!(expand_year("123"), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(date("Total 12.50\nThank you"), None);
        assert_eq!(date(""), None);
    }
}
