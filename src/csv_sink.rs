// 📄 CSV Sink - Enriched records → flat file
// Header row + one line per bank, field order Name, USD, GBP, EUR, INR.
// The file is overwritten on every run.

use crate::error::{EtlError, Stage};
use crate::logger::{logged_stage, ProgressLog, StageMessages};
use crate::transform::EnrichedBankRecord;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const CSV_MESSAGES: StageMessages = StageMessages {
    started: "Starting CSV file creation",
    completed: "Data successfully saved to CSV",
    failed: "Error saving to CSV",
};

/// Write the file, then hash what landed on disk.
///
/// Returns the hex SHA-256 of the written file.
pub fn write_csv(
    records: &[EnrichedBankRecord],
    path: &Path,
    log: &dyn ProgressLog,
) -> Result<String, EtlError> {
    logged_stage(log, Stage::Load, CSV_MESSAGES, || {
        save_csv(records, path)?;
        file_sha256(path)
    })
}

/// Serialize without progress logging
pub fn save_csv(records: &[EnrichedBankRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    // Explicit header so an empty record set still produces one
    if records.is_empty() {
        wtr.write_record(crate::transform::COLUMNS)
            .context("Failed to write CSV header")?;
    }
    for record in records {
        wtr.serialize(record)
            .with_context(|| format!("Failed to write CSV row for {}", record.name))?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush CSV file {}", path.display()))?;
    Ok(())
}

/// Load an enriched CSV back into records
pub fn read_csv(path: &Path) -> Result<Vec<EnrichedBankRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: EnrichedBankRecord = result.context("Failed to deserialize bank record")?;
        records.push(record);
    }

    Ok(records)
}

/// Hex SHA-256 of a file's bytes
pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
