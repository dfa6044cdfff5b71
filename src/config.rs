// ⚙️ Run Configuration
// Defaults reproduce the canonical job; a TOML file may override any key.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_RATES_URL: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMSkillsNetwork-PY0221EN-Coursera/labs/v2/exchange_rate.csv";
pub const DEFAULT_CSV_PATH: &str = "./Largest_banks_data.csv";
pub const DEFAULT_DB_PATH: &str = "Banks.db";
pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";
pub const DEFAULT_LOG_PATH: &str = "code_log.txt";
pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_USD_THRESHOLD: f64 = 100.0;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Page holding the "by market capitalization" table
    pub source_url: String,

    /// Delimited document with `Currency`,`Rate` columns
    pub rates_url: String,

    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,

    /// How many banks to keep from the top of the table
    pub top_n: usize,

    /// USD billions; the filter query returns banks strictly above this
    pub usd_threshold: f64,

    pub http_timeout_secs: u64,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            top_n: DEFAULT_TOP_N,
            usd_threshold: DEFAULT_USD_THRESHOLD,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl EtlConfig {
    /// Load a TOML file; keys it omits keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: EtlConfig = toml::from_str(text).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            bail!("source_url must not be empty");
        }
        if self.rates_url.trim().is_empty() {
            bail!("rates_url must not be empty");
        }
        if self.csv_path.as_os_str().is_empty() {
            bail!("csv_path must not be empty");
        }
        if self.db_path.as_os_str().is_empty() {
            bail!("db_path must not be empty");
        }
        if self.log_path.as_os_str().is_empty() {
            bail!("log_path must not be empty");
        }
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if !self.usd_threshold.is_finite() {
            bail!("usd_threshold must be a finite number");
        }
        validate_table_name(&self.table_name)?;
        Ok(())
    }
}

/// The table name ends up inside DDL, so only plain identifiers are accepted
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        bail!("invalid table name {:?}: expected [A-Za-z_][A-Za-z0-9_]*", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_canonical_job() {
        let config = EtlConfig::default();

        assert_eq!(config.csv_path, PathBuf::from("./Largest_banks_data.csv"));
        assert_eq!(config.db_path, PathBuf::from("Banks.db"));
        assert_eq!(config.table_name, "Largest_banks");
        assert_eq!(config.log_path, PathBuf::from("code_log.txt"));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.usd_threshold, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EtlConfig::from_toml(
            r#"
            db_path = "/tmp/other.db"
            top_n = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("etl.toml");
        fs::write(&path, "table_name = \"Banks_2023\"\n").unwrap();

        let config = EtlConfig::load(Some(&path)).unwrap();
        assert_eq!(config.table_name, "Banks_2023");

        assert!(EtlConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
        assert_eq!(EtlConfig::load(None).unwrap(), EtlConfig::default());
    }

    #[test]
    fn test_rejects_zero_top_n() {
        assert!(EtlConfig::from_toml("top_n = 0").is_err());
    }

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("Largest_banks").is_ok());
        assert!(validate_table_name("_t1").is_ok());

        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("1banks").is_err());
        assert!(validate_table_name("banks; DROP TABLE x").is_err());
        assert!(validate_table_name("my-table").is_err());
    }
}
