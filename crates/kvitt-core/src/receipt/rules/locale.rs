//! Locale tables: month names and the keywords the extractors anchor on.
//!
//! All words are lower case. Regexes built from these lists live in
//! [`super::patterns`].

/// Month names and abbreviations, mapped to the month number.
///
/// Languages: English, German, Norwegian, Danish, Swedish, Dutch, Spanish,
/// French. Every name appears once; names shared by several languages
/// (`april`, `juni`, `mars`, ...) are listed a single time.
#[rustfmt::skip]
pub const MONTHS: &[(&str, u32)] = &[
    // January
    ("january", 1), ("jan", 1), ("januar", 1), ("jänner", 1), ("januari", 1),
    ("enero", 1), ("ene", 1), ("janvier", 1), ("janv", 1),
    // February
    ("february", 2), ("feb", 2), ("februar", 2), ("februari", 2), ("febrero", 2),
    ("février", 2), ("fevrier", 2), ("févr", 2), ("fév", 2), ("fev", 2),
    // March
    ("march", 3), ("mar", 3), ("märz", 3), ("maerz", 3), ("mär", 3), ("mars", 3),
    ("maart", 3), ("mrt", 3), ("marzo", 3),
    // April
    ("april", 4), ("apr", 4), ("abril", 4), ("abr", 4), ("avril", 4), ("avr", 4),
    // May
    ("may", 5), ("mai", 5), ("maj", 5), ("mei", 5), ("mayo", 5),
    // June
    ("june", 6), ("jun", 6), ("juni", 6), ("junio", 6), ("juin", 6),
    // July
    ("july", 7), ("jul", 7), ("juli", 7), ("julio", 7), ("juillet", 7), ("juil", 7),
    // August
    ("august", 8), ("aug", 8), ("augusti", 8), ("augustus", 8), ("agosto", 8),
    ("ago", 8), ("août", 8), ("aout", 8),
    // September
    ("september", 9), ("sep", 9), ("sept", 9), ("septiembre", 9), ("setiembre", 9),
    ("septembre", 9),
    // October
    ("october", 10), ("oct", 10), ("oktober", 10), ("okt", 10), ("octubre", 10),
    ("octobre", 10),
    // November
    ("november", 11), ("nov", 11), ("noviembre", 11), ("novembre", 11),
    // December
    ("december", 12), ("dec", 12), ("dezember", 12), ("dez", 12), ("desember", 12),
    ("des", 12), ("diciembre", 12), ("dic", 12), ("décembre", 12), ("decembre", 12),
    ("déc", 12),
];

/// Canonical month number for a (case-insensitive) month word.
///
/// A trailing abbreviation dot is ignored.
pub fn month_number(word: &str) -> Option<u32> {
    let word = word.trim_end_matches('.').to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, month)| *month)
}

/// Words introducing the grand total line.
pub const TOTAL_KEYWORDS: &[&str] = &[
    "total", "totaal", "summe", "gesamt", "i alt", "att betala", "à payer", "a payer",
    "importe total",
];

/// `sum` only as a whole word; `summary` is not a total.
pub const TOTAL_WORDS: &[&str] = &["sum"];

/// Broader amount keywords for the fallback strategy.
pub const AMOUNT_KEYWORDS: &[&str] = &[
    "amount", "sum", "due", "pay", "balance", "betrag", "beløp", "belop", "bedrag",
    "zu zahlen", "montant", "importe", "belopp", "a pagar", "å betale",
];

/// Substring that marks a subtotal line; such lines never carry the total.
pub const SUBTOTAL_MARKER: &str = "sub";

/// Subtotal keywords.
pub const SUBTOTAL_KEYWORDS: &[&str] = &[
    "subtotal", "sub-total", "sub total", "zwischensumme", "netto", "subtotaal", "delsum",
    "sous-total", "subtotale",
];

/// Tax keywords (whole words).
pub const TAX_KEYWORDS: &[&str] = &["tax", "vat", "mwst", "ust", "moms", "mva", "btw", "tva", "iva"];

/// Keywords that anchor a numeric day-first date.
pub const DATE_KEYWORDS: &[&str] = &["datum", "date", "dato", "fecha", "data"];

/// Phrases that introduce the payment date.
pub const PAYMENT_PHRASES: &[&str] = &[
    "date paid", "paid on", "payment date", "bezahlt am", "zahlungsdatum", "betalt",
];

/// Regex alternation matching any of `words` literally.
pub fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

/// Alternation over every name in [`MONTHS`], longest first.
pub fn month_alternation() -> String {
    let mut names: Vec<&str> = MONTHS.iter().map(|(name, _)| *name).collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));
    alternation(&names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_month_names_are_unique() {
        let mut seen = HashSet::new();
        for (name, month) in MONTHS {
            assert!(seen.insert(*name), "duplicate month name {name}");
            assert!((1..=12).contains(month));
        }
    }

    #[test]
    fn test_every_month_is_covered() {
        let months: HashSet<u32> = MONTHS.iter().map(|(_, m)| *m).collect();
        assert_eq!(months.len(), 12);
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("January"), Some(1));
        assert_eq!(month_number("MÄRZ"), Some(3));
        assert_eq!(month_number("okt."), Some(10));
        assert_eq!(month_number("août"), Some(8));
        assert_eq!(month_number("mei"), Some(5));
        assert_eq!(month_number("desember"), Some(12));
        assert_eq!(month_number("kasse"), None);
    }

    #[test]
    fn test_month_alternation_prefers_longer_names() {
        let alt = month_alternation();
        let september = alt.find("|september|").unwrap();
        let sep = alt.find("|sep|").unwrap();
        assert!(september < sep);
        assert_eq!(alt.split('|').count(), MONTHS.len());
    }

    #[test]
    fn test_alternation_escapes() {
        assert_eq!(alternation(&["a.b", "c"]), r"a\.b|c");
    }
}
