// 💱 Rate Table - USD → GBP / EUR / INR multipliers
// Parsed from a small `Currency,Rate` CSV. All three target currencies must
// be present, numeric and positive, otherwise no table is built at all.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Target currencies of the conversion, in output column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    /// ISO 4217 code as it appears in the rate sheet
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }
}

/// Raw row of the rate sheet; the rate stays text until validated
#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: String,
}

/// Complete set of multipliers; construction fails if any is missing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    gbp: f64,
    eur: f64,
    inr: f64,
}

impl RateTable {
    pub fn get(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Gbp => self.gbp,
            Currency::Eur => self.eur,
            Currency::Inr => self.inr,
        }
    }

    /// Build from (code, rate) pairs. Unknown codes are ignored; the last
    /// occurrence of a repeated code wins.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let mut found: [Option<f64>; 3] = [None; 3];

        for (code, rate) in pairs {
            let Some(currency) = Currency::from_code(code) else {
                continue;
            };
            if !rate.is_finite() || rate <= 0.0 {
                bail!("rate for {} must be a positive number, got {}", currency.code(), rate);
            }
            found[currency as usize] = Some(rate);
        }

        let missing: Vec<&str> = Currency::ALL
            .iter()
            .filter(|c| found[**c as usize].is_none())
            .map(|c| c.code())
            .collect();
        if !missing.is_empty() {
            bail!("rate table is missing {}", missing.join(", "));
        }

        Ok(RateTable {
            gbp: found[Currency::Gbp as usize].unwrap_or_default(),
            eur: found[Currency::Eur as usize].unwrap_or_default(),
            inr: found[Currency::Inr as usize].unwrap_or_default(),
        })
    }

    /// Parse a `Currency,Rate` CSV document
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut pairs: Vec<(String, f64)> = Vec::new();
        for result in rdr.deserialize() {
            let row: RateRow = result.context("Failed to read rate row")?;
            if Currency::from_code(&row.currency).is_none() {
                continue;
            }
            let rate = row
                .rate
                .parse::<f64>()
                .with_context(|| format!("rate for {} is not numeric: {:?}", row.currency, row.rate))?;
            pairs.push((row.currency, rate));
        }

        Self::from_pairs(pairs.iter().map(|(code, rate)| (code.as_str(), *rate)))
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_sheet() {
        let table = RateTable::from_csv_str("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();

        assert_eq!(table.get(Currency::Gbp), 0.8);
        assert_eq!(table.get(Currency::Eur), 0.93);
        assert_eq!(table.get(Currency::Inr), 82.95);
    }

    #[test]
    fn test_extra_currencies_are_ignored() {
        let table =
            RateTable::from_csv_str("Currency,Rate\nJPY,not-a-rate\nEUR,0.93\nGBP,0.8\nINR,82.5\n").unwrap();
        assert_eq!(table.get(Currency::Inr), 82.5);
    }

    #[test]
    fn test_missing_inr_is_error() {
        let err = RateTable::from_csv_str("Currency,Rate\nEUR,0.93\nGBP,0.8\n").unwrap_err();
        assert!(err.to_string().contains("missing INR"));
    }

    #[test]
    fn test_non_numeric_rate_is_error() {
        let err = RateTable::from_csv_str("Currency,Rate\nEUR,abc\nGBP,0.8\nINR,82.5\n").unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }

    #[test]
    fn test_non_positive_rate_is_error() {
        assert!(RateTable::from_pairs([("GBP", 0.0), ("EUR", 0.9), ("INR", 80.0)]).is_err());
        assert!(RateTable::from_pairs([("GBP", -1.0), ("EUR", 0.9), ("INR", 80.0)]).is_err());
    }

    #[test]
    fn test_wrong_columns_is_error() {
        assert!(RateTable::from_csv_str("Code,Value\nEUR,0.93\n").is_err());
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::from_code("gbp"), Some(Currency::Gbp));
        assert_eq!(Currency::from_code(" INR "), Some(Currency::Inr));
        assert_eq!(Currency::from_code("USD"), None);
    }
}
