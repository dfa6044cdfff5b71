// 🗄️ Relational Sink - Enriched records → SQLite table
// Replace semantics: the named table is dropped and recreated on every run,
// inside one transaction, so a reader sees either the old table or the new one.
// The connection lives only for the duration of one call.

use crate::config::validate_table_name;
use crate::error::{EtlError, Stage};
use crate::logger::{logged_stage, ProgressLog, StageMessages};
use crate::transform::EnrichedBankRecord;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

pub const DB_MESSAGES: StageMessages = StageMessages {
    started: "Starting database loading",
    completed: "Data successfully loaded to database",
    failed: "Error loading to database",
};

/// Open (creating if needed) the store and replace `table_name` with `records`.
///
/// Returns the row count of the table as read back after the commit.
pub fn write_table(
    records: &[EnrichedBankRecord],
    store_path: &Path,
    table_name: &str,
    log: &dyn ProgressLog,
) -> Result<usize, EtlError> {
    logged_stage(log, Stage::Load, DB_MESSAGES, || {
        validate_table_name(table_name)?;

        let mut conn = Connection::open(store_path)
            .with_context(|| format!("Failed to open database {}", store_path.display()))?;
        let inserted = replace_table(&mut conn, table_name, records)?;
        let stored = verify_count(&conn, table_name)
            .with_context(|| format!("Failed to count rows of {}", table_name))?;
        conn.close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")?;

        tracing::debug!("inserted {} rows, {} stored in {}", inserted, stored, table_name);
        Ok(stored as usize)
    })
}

/// Drop + create + insert in one transaction
pub fn replace_table(
    conn: &mut Connection,
    table_name: &str,
    records: &[EnrichedBankRecord],
) -> Result<usize> {
    let tx = conn.transaction().context("Failed to begin transaction")?;

    setup_table(&tx, table_name)?;
    let inserted = insert_banks(&tx, table_name, records)?;

    tx.commit().context("Failed to commit transaction")?;
    Ok(inserted)
}

/// Discard any previous definition and rows of the table, then recreate it
pub fn setup_table(conn: &Connection, table_name: &str) -> Result<()> {
    conn.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table_name), [])
        .with_context(|| format!("Failed to drop table {}", table_name))?;

    conn.execute(
        &format!(
            "CREATE TABLE \"{}\" (
                Name TEXT NOT NULL,
                MC_USD_Billion REAL NOT NULL,
                MC_GBP_Billion REAL NOT NULL,
                MC_EUR_Billion REAL NOT NULL,
                MC_INR_Billion REAL NOT NULL
            )",
            table_name
        ),
        [],
    )
    .with_context(|| format!("Failed to create table {}", table_name))?;

    Ok(())
}

pub fn insert_banks(
    conn: &Connection,
    table_name: &str,
    records: &[EnrichedBankRecord],
) -> Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO \"{}\" (
            Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        table_name
    ))?;

    let mut inserted = 0;
    for record in records {
        stmt.execute(params![
            record.name,
            record.market_cap_usd,
            record.market_cap_gbp,
            record.market_cap_eur,
            record.market_cap_inr,
        ])
        .with_context(|| format!("Failed to insert {}", record.name))?;
        inserted += 1;
    }

    Ok(inserted)
}

/// True if the store has a table with this name
pub fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_all_banks(conn: &Connection, table_name: &str) -> Result<Vec<EnrichedBankRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
         FROM \"{}\"",
        table_name
    ))?;

    let banks = stmt
        .query_map([], |row| {
            Ok(EnrichedBankRecord {
                name: row.get(0)?,
                market_cap_usd: row.get(1)?,
                market_cap_gbp: row.get(2)?,
                market_cap_eur: row.get(3)?,
                market_cap_inr: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(banks)
}

pub fn verify_count(conn: &Connection, table_name: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table_name), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryProgressLog;
    use tempfile::TempDir;

    fn create_test_record(name: &str, usd: f64) -> EnrichedBankRecord {
        EnrichedBankRecord {
            name: name.to_string(),
            market_cap_usd: usd,
            market_cap_gbp: usd * 0.8,
            market_cap_eur: usd * 0.93,
            market_cap_inr: usd * 82.5,
        }
    }

    fn sorted(mut banks: Vec<EnrichedBankRecord>) -> Vec<EnrichedBankRecord> {
        banks.sort_by(|a, b| a.name.cmp(&b.name));
        banks
    }

    #[test]
    fn test_write_table_creates_store() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("Banks.db");
        let log = MemoryProgressLog::new();
        let records = vec![create_test_record("Bank A", 1000.5), create_test_record("Bank B", 200.0)];

        let inserted = write_table(&records, &db_path, "Largest_banks", &log).unwrap();

        assert_eq!(inserted, 2);
        assert!(db_path.exists());

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(verify_count(&conn, "Largest_banks").unwrap(), 2);
        assert_eq!(sorted(get_all_banks(&conn, "Largest_banks").unwrap()), sorted(records));
        assert_eq!(
            log.messages(),
            vec!["Starting database loading", "Data successfully loaded to database"]
        );
    }

    #[test]
    fn test_replace_not_append() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("Banks.db");
        let log = MemoryProgressLog::new();
        let records = vec![create_test_record("Bank A", 1000.5), create_test_record("Bank B", 200.0)];

        write_table(&records, &db_path, "Largest_banks", &log).unwrap();
        write_table(&records, &db_path, "Largest_banks", &log).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(verify_count(&conn, "Largest_banks").unwrap(), 2);

        println!("✅ Replace semantics: second load left 2 rows, not 4");
    }

    #[test]
    fn test_write_table_reports_stored_rows() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("Banks.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            setup_table(&conn, "Largest_banks").unwrap();
            let stale: Vec<EnrichedBankRecord> =
                (0..5).map(|i| create_test_record(&format!("Old {}", i), 1.0)).collect();
            insert_banks(&conn, "Largest_banks", &stale).unwrap();
        }

        let log = MemoryProgressLog::new();
        let records = vec![create_test_record("Bank A", 1000.5), create_test_record("Bank B", 200.0)];
        let stored = write_table(&records, &db_path, "Largest_banks", &log).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(stored, 2);
        assert_eq!(stored as i64, verify_count(&conn, "Largest_banks").unwrap());
    }

    #[test]
    fn test_replace_discards_old_schema() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("Banks.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE Largest_banks (legacy INTEGER)", []).unwrap();
            conn.execute("INSERT INTO Largest_banks VALUES (1)", []).unwrap();
        }

        let log = MemoryProgressLog::new();
        write_table(&[create_test_record("Bank A", 5.0)], &db_path, "Largest_banks", &log).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let banks = get_all_banks(&conn, "Largest_banks").unwrap();
        assert_eq!(banks, vec![create_test_record("Bank A", 5.0)]);
    }

    #[test]
    fn test_empty_record_set_leaves_empty_table() {
        let mut conn = Connection::open_in_memory().unwrap();

        replace_table(&mut conn, "Largest_banks", &[create_test_record("Bank A", 1.0)]).unwrap();
        replace_table(&mut conn, "Largest_banks", &[]).unwrap();

        assert!(table_exists(&conn, "Largest_banks").unwrap());
        assert_eq!(verify_count(&conn, "Largest_banks").unwrap(), 0);
    }

    #[test]
    fn test_unopenable_store_is_load_error() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("missing_dir").join("Banks.db");
        let log = MemoryProgressLog::new();

        let err = write_table(&[], &db_path, "Largest_banks", &log).unwrap_err();

        assert!(matches!(err, EtlError::Load(_)));
        assert!(log.contains("Error loading to database"));
    }

    #[test]
    fn test_invalid_table_name_is_load_error() {
        let dir = TempDir::new().unwrap();
        let log = MemoryProgressLog::new();

        let err = write_table(&[], &dir.path().join("Banks.db"), "x\"; DROP", &log).unwrap_err();

        assert!(matches!(err, EtlError::Load(ref m) if m.contains("invalid table name")));
    }

    #[test]
    fn test_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, "Largest_banks").unwrap());
        setup_table(&conn, "Largest_banks").unwrap();
        assert!(table_exists(&conn, "Largest_banks").unwrap());
    }
}
