// Largest Banks ETL - Core Library
// Exposes every stage for the CLI and for tests

pub mod config;
pub mod csv_sink;
pub mod db;
pub mod error;
pub mod extract;
pub mod logger;
pub mod pipeline;
pub mod queries;
pub mod rates;
pub mod report;
pub mod source;
pub mod transform;

// Re-export commonly used types
pub use config::EtlConfig;
pub use csv_sink::{read_csv, write_csv};
pub use db::write_table;
pub use error::{EtlError, Stage};
pub use extract::{BankRecord, Extractor, TableMatcher};
pub use logger::{FileProgressLog, MemoryProgressLog, ProgressLog};
pub use pipeline::{Pipeline, RunSummary};
pub use queries::{run_verification_queries, QueryResults};
pub use rates::{Currency, RateTable};
pub use source::{DocumentSource, HttpSource};
pub use transform::{apply_rates, transform, EnrichedBankRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
