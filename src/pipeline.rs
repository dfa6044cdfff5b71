// 🚚 Pipeline Driver - extract → transform → CSV → SQLite → queries
// Strictly sequential and fail-fast: the first stage error ends the run and
// nothing downstream of it is attempted (a CSV failure also skips SQLite).

use crate::config::EtlConfig;
use crate::csv_sink::write_csv;
use crate::db::write_table;
use crate::error::EtlError;
use crate::extract::{Extractor, TableMatcher};
use crate::logger::ProgressLog;
use crate::queries::{run_verification_queries, QueryResults};
use crate::report;
use crate::source::DocumentSource;
use crate::transform::transform;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub extracted: usize,
    pub rows_loaded: usize,
    /// SHA-256 of the CSV file; equal across runs with equal inputs
    pub csv_sha256: String,
    pub queries: QueryResults,
}

pub struct Pipeline<'a> {
    config: &'a EtlConfig,
    source: &'a dyn DocumentSource,
    log: &'a dyn ProgressLog,
    echo: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a EtlConfig, source: &'a dyn DocumentSource, log: &'a dyn ProgressLog) -> Self {
        Pipeline {
            config,
            source,
            log,
            echo: true,
        }
    }

    /// Print each stage's output to stdout (on by default)
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn run(&self) -> Result<RunSummary, EtlError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();

        self.log.log("Starting ETL pipeline");
        tracing::info!(run_id = %run_id, "pipeline started");

        match self.run_stages(run_id, started_at) {
            Ok(summary) => {
                self.log.log("ETL pipeline completed successfully");
                Ok(summary)
            }
            Err(e) => {
                self.log.log(&format!("ETL pipeline aborted after {} failure", e.stage().name()));
                Err(e)
            }
        }
    }

    fn run_stages(&self, run_id: String, started_at: DateTime<Utc>) -> Result<RunSummary, EtlError> {
        let config = self.config;

        // Extract
        let extractor = Extractor::new(TableMatcher::market_cap_table(), config.top_n);
        let banks = extractor.extract(self.source, &config.source_url, self.log)?;
        if self.echo {
            report::print_extracted(&banks);
        }

        // Transform
        let enriched = transform(&banks, self.source, &config.rates_url, self.log)?;
        if self.echo {
            report::print_transformed(&enriched);
        }

        // Load: CSV first, then SQLite
        let csv_sha256 = write_csv(&enriched, &config.csv_path, self.log)?;
        let rows_loaded = write_table(&enriched, &config.db_path, &config.table_name, self.log)?;
        check_row_count(enriched.len(), rows_loaded).map_err(|e| {
            self.log.log(&format!("Error loading to database: {}", e));
            e
        })?;

        // Verify
        let queries = run_verification_queries(
            &config.db_path,
            &config.table_name,
            config.usd_threshold,
            self.log,
        )?;
        if self.echo {
            report::print_query_results(&queries);
        }

        Ok(RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            extracted: banks.len(),
            rows_loaded,
            csv_sha256,
            queries,
        })
    }

    /// Only the verification queries, against whatever the store holds now
    pub fn run_queries(&self) -> Result<QueryResults, EtlError> {
        let config = self.config;
        let queries = run_verification_queries(
            &config.db_path,
            &config.table_name,
            config.usd_threshold,
            self.log,
        )?;
        if self.echo {
            report::print_query_results(&queries);
        }
        Ok(queries)
    }
}

/// The table read back after the load must hold exactly the records written
pub fn check_row_count(records: usize, stored: usize) -> Result<(), EtlError> {
    if records != stored {
        return Err(EtlError::Load(format!(
            "row count mismatch: {} records, {} rows stored",
            records, stored
        )));
    }
    Ok(())
}
