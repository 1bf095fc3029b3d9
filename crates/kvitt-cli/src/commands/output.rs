//! Output formatting shared by `process` and `batch`.

use kvitt_core::ExtractionResult;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub const CSV_HEADER: [&str; 6] = ["amount", "currency", "date", "merchant", "subtotal", "tax"];

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// CSV cells in `CSV_HEADER` order; missing fields are empty.
pub fn csv_fields(result: &ExtractionResult) -> [String; 6] {
    [
        result.amount.map(|a| a.to_string()).unwrap_or_default(),
        result.currency.map(|c| c.to_string()).unwrap_or_default(),
        result.date.map(|d| d.to_string()).unwrap_or_default(),
        result.merchant.clone().unwrap_or_default(),
        result.subtotal.map(|a| a.to_string()).unwrap_or_default(),
        result.tax.map(|a| a.to_string()).unwrap_or_default(),
    ]
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_fields(result))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let currency = result.currency.map(|c| c.to_string()).unwrap_or_default();
    let mut output = String::new();

    output.push_str(&format!(
        "Merchant: {}\n",
        result.merchant.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "Date:     {}\n",
        result.date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    ));
    match result.amount {
        Some(amount) => output.push_str(format!("Amount:   {} {}", amount, currency).trim_end()),
        None => output.push_str("Amount:   -"),
    }
    output.push('\n');

    if let Some(subtotal) = result.subtotal {
        output.push_str(&format!("Subtotal: {}\n", subtotal));
    }
    if let Some(tax) = result.tax {
        output.push_str(&format!("Tax:      {}\n", tax));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvitt_core::ReceiptParser;
    use kvitt_core::RawText;

    fn sample() -> ExtractionResult {
        ReceiptParser::default().parse(&RawText::new(
            "Cafe Nord\nTotal EUR 12.50\nDatum 01.02.2024",
        ))
    }

    #[test]
    fn test_csv_output() {
        let csv = format_result(&sample(), OutputFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "amount,currency,date,merchant,subtotal,tax\n12.50,EUR,2024-02-01,Cafe Nord,,\n"
        );
    }

    #[test]
    fn test_text_output() {
        let text = format_result(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Merchant: Cafe Nord\nDate:     2024-02-01\nAmount:   12.50 EUR\n"
        );
    }

    #[test]
    fn test_text_output_missing_fields() {
        let result = ExtractionResult::empty(RawText::default());
        let text = format_result(&result, OutputFormat::Text).unwrap();
        assert_eq!(text, "Merchant: -\nDate:     -\nAmount:   -\n");
    }
}
