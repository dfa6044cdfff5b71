// 🔄 Transformer - USD market caps → GBP / EUR / INR
//
// Rounding: every converted figure is rounded to 2 decimals, half away from
// zero (f64::round on the value scaled by 100). 1000.50 * 0.93 = 930.465
// therefore persists as 930.47.

use crate::error::{EtlError, Stage};
use crate::extract::BankRecord;
use crate::logger::{logged_stage, ProgressLog, StageMessages};
use crate::rates::{Currency, RateTable};
use crate::source::DocumentSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const TRANSFORM_MESSAGES: StageMessages = StageMessages {
    started: "Starting data transformation",
    completed: "Data transformation completed successfully",
    failed: "Error during transformation",
};

/// Terminal record shape, persisted to both sinks.
///
/// Serde names are the CSV header / SQL column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub market_cap_usd: f64,

    #[serde(rename = "MC_GBP_Billion")]
    pub market_cap_gbp: f64,

    #[serde(rename = "MC_EUR_Billion")]
    pub market_cap_eur: f64,

    #[serde(rename = "MC_INR_Billion")]
    pub market_cap_inr: f64,
}

/// Column names in output order
pub const COLUMNS: [&str; 5] = [
    "Name",
    "MC_USD_Billion",
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

impl EnrichedBankRecord {
    pub fn from_record(record: &BankRecord, rates: &RateTable) -> Self {
        EnrichedBankRecord {
            name: record.name.clone(),
            market_cap_usd: record.market_cap_usd,
            market_cap_gbp: convert(record.market_cap_usd, rates, Currency::Gbp),
            market_cap_eur: convert(record.market_cap_usd, rates, Currency::Eur),
            market_cap_inr: convert(record.market_cap_usd, rates, Currency::Inr),
        }
    }

    pub fn market_cap(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Gbp => self.market_cap_gbp,
            Currency::Eur => self.market_cap_eur,
            Currency::Inr => self.market_cap_inr,
        }
    }
}

/// Round to 2 decimals, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn convert(usd: f64, rates: &RateTable, currency: Currency) -> f64 {
    round2(usd * rates.get(currency))
}

/// Enrich every record; output keeps input length and order
pub fn apply_rates(records: &[BankRecord], rates: &RateTable) -> Vec<EnrichedBankRecord> {
    records
        .iter()
        .map(|r| EnrichedBankRecord::from_record(r, rates))
        .collect()
}

pub fn fetch_rates(source: &dyn DocumentSource, rates_url: &str) -> Result<RateTable> {
    let text = source.fetch_text(rates_url)?;
    RateTable::from_csv_str(&text).with_context(|| format!("Malformed rate table at {}", rates_url))
}

/// Fetch the rate table, then convert. The rate table is complete before
/// any record is touched.
pub fn transform(
    records: &[BankRecord],
    source: &dyn DocumentSource,
    rates_url: &str,
    log: &dyn ProgressLog,
) -> Result<Vec<EnrichedBankRecord>, EtlError> {
    logged_stage(log, Stage::Transform, TRANSFORM_MESSAGES, || {
        let rates = fetch_rates(source, rates_url)?;
        Ok(apply_rates(records, &rates))
    })
}
