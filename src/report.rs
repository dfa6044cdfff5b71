// 🖥️ Console Report - Human-readable dumps of each stage's output
// Not a data contract; formatting may change freely.

use crate::extract::BankRecord;
use crate::queries::QueryResults;
use crate::transform::{EnrichedBankRecord, COLUMNS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header.to_vec());
    table
}

pub fn bank_table(records: &[BankRecord]) -> Table {
    let mut table = new_table(&["#", COLUMNS[0], COLUMNS[1]]);
    for (i, r) in records.iter().enumerate() {
        table.add_row(vec![i.to_string(), r.name.clone(), format!("{:.2}", r.market_cap_usd)]);
    }
    table
}

pub fn enriched_table(records: &[EnrichedBankRecord]) -> Table {
    let mut header = vec!["#"];
    header.extend_from_slice(&COLUMNS);

    let mut table = new_table(&header);
    for (i, r) in records.iter().enumerate() {
        table.add_row(vec![
            i.to_string(),
            r.name.clone(),
            format!("{:.2}", r.market_cap_usd),
            format!("{:.2}", r.market_cap_gbp),
            format!("{:.2}", r.market_cap_eur),
            format!("{:.2}", r.market_cap_inr),
        ]);
    }
    table
}

/// All three query results as one printable block
pub fn query_report(results: &QueryResults) -> String {
    let mut above = new_table(&[COLUMNS[0], COLUMNS[1]]);
    for r in &results.above_threshold {
        above.add_row(vec![r.name.clone(), format!("{:.2}", r.market_cap_usd)]);
    }

    let all = enriched_table(&results.all_rows);

    format!(
        "All Records:\n{}\n\nAverage Market Cap in USD:\n{}\n\nBanks with Market Cap > {} billion USD:\n{}",
        all,
        results.average_display(),
        results.threshold_usd,
        above
    )
}

pub fn print_extracted(records: &[BankRecord]) {
    println!("\nExtracted Data:");
    println!("{}", bank_table(records));
}

pub fn print_transformed(records: &[EnrichedBankRecord]) {
    println!("\nTransformed Data:");
    println!("{}", enriched_table(records));
}

pub fn print_query_results(results: &QueryResults) {
    println!("\n{}", query_report(results));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_report_sections() {
        let results = QueryResults {
            all_rows: vec![EnrichedBankRecord {
                name: "Bank B".to_string(),
                market_cap_usd: 200.0,
                market_cap_gbp: 160.0,
                market_cap_eur: 186.0,
                market_cap_inr: 16500.0,
            }],
            average_usd: Some(200.0),
            threshold_usd: 100.0,
            above_threshold: vec![BankRecord { name: "Bank B".to_string(), market_cap_usd: 200.0 }],
        };

        let report = query_report(&results);

        assert!(report.contains("All Records:"));
        assert!(report.contains("Average Market Cap in USD:\n200.00"));
        assert!(report.contains("Banks with Market Cap > 100 billion USD:"));
        assert!(report.contains("16500.00"));
    }

    #[test]
    fn test_bank_table_rows() {
        let table = bank_table(&[BankRecord { name: "JPMorgan Chase".to_string(), market_cap_usd: 432.92 }]);
        let text = table.to_string();

        assert!(text.contains("JPMorgan Chase"));
        assert!(text.contains("432.92"));
        assert!(text.contains("MC_USD_Billion"));
    }
}
