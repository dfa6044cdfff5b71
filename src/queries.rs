// 🔍 Query Runner - Read-only verification of the loaded table
// Three fixed queries: full scan, mean USD market cap, banks above a USD
// threshold. The store is opened read-only so running them cannot change it.

use crate::config::validate_table_name;
use crate::db::{get_all_banks, table_exists};
use crate::error::{EtlError, Stage};
use crate::extract::BankRecord;
use crate::logger::{logged_stage, ProgressLog, StageMessages};
use crate::transform::{round2, EnrichedBankRecord};
use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;

pub const QUERY_MESSAGES: StageMessages = StageMessages {
    started: "Starting database queries",
    completed: "Database queries completed successfully",
    failed: "Error running queries",
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResults {
    /// Every row, in store order
    pub all_rows: Vec<EnrichedBankRecord>,

    /// Mean of MC_USD_Billion; None when the table is empty
    pub average_usd: Option<f64>,

    pub threshold_usd: f64,

    /// Name and USD market cap of banks strictly above `threshold_usd`
    pub above_threshold: Vec<BankRecord>,
}

impl QueryResults {
    /// Average rounded to 2 decimals
    pub fn average_usd_rounded(&self) -> Option<f64> {
        self.average_usd.map(round2)
    }

    /// "150.00", or "NULL" for an empty table
    pub fn average_display(&self) -> String {
        match self.average_usd {
            Some(avg) => format!("{:.2}", avg),
            None => "NULL".to_string(),
        }
    }
}

pub fn run_verification_queries(
    store_path: &Path,
    table_name: &str,
    threshold_usd: f64,
    log: &dyn ProgressLog,
) -> Result<QueryResults, EtlError> {
    logged_stage(log, Stage::Query, QUERY_MESSAGES, || {
        let conn = open_read_only(store_path)?;
        let results = run_queries(&conn, table_name, threshold_usd)?;
        conn.close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")?;
        Ok(results)
    })
}

/// Fails if the store file does not exist (never creates one)
pub fn open_read_only(store_path: &Path) -> Result<Connection> {
    if !store_path.exists() {
        bail!("database {} does not exist", store_path.display());
    }
    Connection::open_with_flags(store_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database {}", store_path.display()))
}

pub fn run_queries(conn: &Connection, table_name: &str, threshold_usd: f64) -> Result<QueryResults> {
    validate_table_name(table_name)?;
    if !table_exists(conn, table_name)? {
        bail!("table {} does not exist", table_name);
    }

    let all_rows = get_all_banks(conn, table_name).context("Full table scan failed")?;
    let average_usd = average_usd(conn, table_name)?;
    let above_threshold = banks_above(conn, table_name, threshold_usd)?;

    Ok(QueryResults {
        all_rows,
        average_usd,
        threshold_usd,
        above_threshold,
    })
}

pub fn average_usd(conn: &Connection, table_name: &str) -> Result<Option<f64>> {
    let avg: Option<f64> = conn
        .query_row(
            &format!("SELECT AVG(MC_USD_Billion) FROM \"{}\"", table_name),
            [],
            |row| row.get(0),
        )
        .context("Average query failed")?;
    Ok(avg)
}

pub fn banks_above(conn: &Connection, table_name: &str, threshold_usd: f64) -> Result<Vec<BankRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT Name, MC_USD_Billion FROM \"{}\" WHERE MC_USD_Billion > ?1",
        table_name
    ))?;

    let banks = stmt
        .query_map([threshold_usd], |row| {
            Ok(BankRecord {
                name: row.get(0)?,
                market_cap_usd: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Threshold query failed")?;

    Ok(banks)
}
