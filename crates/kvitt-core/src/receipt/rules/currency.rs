//! Currency detection.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::receipt::CurrencyCode;

/// Detection order. The first currency with any matching pattern wins.
///
/// EUR comes first so a Euro receipt mentioning "kr" is not read as NOK, and
/// NOK closes the krone group because a bare "kr" falls back to it.
pub const CURRENCY_PRIORITY: &[CurrencyCode] = &[
    CurrencyCode::Eur,
    CurrencyCode::Usd,
    CurrencyCode::Gbp,
    CurrencyCode::Chf,
    CurrencyCode::Dkk,
    CurrencyCode::Sek,
    CurrencyCode::Nok,
    CurrencyCode::Huf,
    CurrencyCode::Aed,
];

lazy_static! {
    /// Per-currency detection patterns over lower-cased text, most specific first.
    static ref CURRENCY_PATTERNS: Vec<(CurrencyCode, Vec<Regex>)> = {
        let table: &[(CurrencyCode, &[&str])] = &[
            (CurrencyCode::Eur, &[r"€", r"\beur\b", r"\beuro", r"\d\s*€", r"\beur\s*\d"]),
            (CurrencyCode::Usd, &[r"us\$", r"\$", r"\busd\b", r"\bdollar"]),
            (CurrencyCode::Gbp, &[r"£", r"\bgbp\b", r"\bpounds?\b"]),
            (CurrencyCode::Chf, &[r"\bchf\b", r"\bfr\.\s*\d", r"\bfranken\b", r"\bsfr\b"]),
            (CurrencyCode::Dkk, &[r"\bdkk\b"]),
            (CurrencyCode::Sek, &[r"\bsek\b", r"\bkronor\b"]),
            (CurrencyCode::Nok, &[r"\bnok\b", r"\bkr\b", r"\bkr\.?\s*\d", r"\d\s*kr\b", r"\bkron(?:e|er)\b"]),
            (CurrencyCode::Huf, &[r"\bhuf\b", r"\bft\b", r"\bforint"]),
            (CurrencyCode::Aed, &[r"\baed\b", r"\bdirhams?\b", r"د\.إ"]),
        ];
        table
            .iter()
            .map(|(code, patterns)| {
                let compiled = patterns.iter().map(|p| Regex::new(p).unwrap()).collect();
                (*code, compiled)
            })
            .collect()
    };
}

/// Tokens that tag a number with a currency ("€ 12,00", "12,00 kr").
pub fn amount_tokens(code: CurrencyCode) -> &'static [&'static str] {
    match code {
        CurrencyCode::Eur => &["€", "eur", "euro"],
        CurrencyCode::Usd => &["us$", "$", "usd"],
        CurrencyCode::Gbp => &["£", "gbp"],
        CurrencyCode::Chf => &["chf", "sfr", "fr."],
        CurrencyCode::Dkk => &["dkk", "kr.", "kr"],
        CurrencyCode::Sek => &["sek", "kr.", "kr"],
        CurrencyCode::Nok => &["nok", "kr.", "kr"],
        CurrencyCode::Huf => &["huf", "ft"],
        CurrencyCode::Aed => &["aed", "د.إ"],
    }
}

/// Detect the receipt currency from lower-cased text.
pub fn detect_currency(text_lower: &str) -> Option<CurrencyCode> {
    for code in CURRENCY_PRIORITY {
        let Some((_, patterns)) = CURRENCY_PATTERNS.iter().find(|(c, _)| c == code) else {
            continue;
        };
        if patterns.iter().any(|p| p.is_match(text_lower)) {
            return Some(*code);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_lists_every_currency() {
        assert_eq!(CURRENCY_PRIORITY.len(), CURRENCY_PATTERNS.len());
        for (code, _) in CURRENCY_PATTERNS.iter() {
            assert!(CURRENCY_PRIORITY.contains(code));
        }
    }

    #[test]
    fn test_eur_beats_nok() {
        let text = "bergen kiosk\nbeløp kr 120,00\ntotal eur 12,00";
        assert_eq!(detect_currency(text), Some(CurrencyCode::Eur));

        let text = "12,00 kr\n10,00 €";
        assert_eq!(detect_currency(text), Some(CurrencyCode::Eur));
    }

    #[test]
    fn test_detect_common_currencies() {
        assert_eq!(detect_currency("summe eur 12,34"), Some(CurrencyCode::Eur));
        assert_eq!(detect_currency("total $54.00"), Some(CurrencyCode::Usd));
        assert_eq!(detect_currency("total £9.99"), Some(CurrencyCode::Gbp));
        assert_eq!(detect_currency("total chf 19.90"), Some(CurrencyCode::Chf));
        assert_eq!(detect_currency("i alt dkk 250,00"), Some(CurrencyCode::Dkk));
        assert_eq!(detect_currency("att betala 99,00 sek"), Some(CurrencyCode::Sek));
        assert_eq!(detect_currency("totalt 349,00 kr"), Some(CurrencyCode::Nok));
        assert_eq!(detect_currency("összesen 4 590 ft"), Some(CurrencyCode::Huf));
        assert_eq!(detect_currency("total aed 45.00"), Some(CurrencyCode::Aed));
    }

    #[test]
    fn test_dkk_beats_bare_kr() {
        assert_eq!(detect_currency("dkk\n120,00 kr"), Some(CurrencyCode::Dkk));
    }

    #[test]
    fn test_no_currency() {
        assert_eq!(detect_currency("thank you for shopping"), None);
        assert_eq!(detect_currency(""), None);
        // "eur" inside a word is not a currency tag
        assert_eq!(detect_currency("neuronal 12.00"), None);
    }
}
