// 🏦 Extractor - Market-cap table → BankRecords
// Finds the "by market capitalization" table on the page and reads the top
// N banks in rank order.
//
// Which table is "the" table is decided by TableMatcher, an explicit
// predicate over the table's class attribute, so it can be tested without
// fetching anything.

use crate::error::{EtlError, Stage};
use crate::logger::{logged_stage, ProgressLog, StageMessages};
use crate::source::DocumentSource;
use anyhow::{anyhow, bail, Context, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

pub const EXTRACT_MESSAGES: StageMessages = StageMessages {
    started: "Starting data extraction",
    completed: "Data extraction completed successfully",
    failed: "Error during extraction",
};

/// Class signature of the market-capitalization table
pub const MARKET_CAP_TABLE_CLASSES: &[&str] = &["wikitable", "sortable", "mw-collapsible"];

// ============================================================================
// BANK RECORD
// ============================================================================

/// One extracted row: bank name and market cap in USD billions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub name: String,
    pub market_cap_usd: f64,
}

impl BankRecord {
    /// Name is trimmed and must be non-empty; market cap must be finite and >= 0
    pub fn new(name: &str, market_cap_usd: f64) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            bail!("bank name is empty");
        }
        if !market_cap_usd.is_finite() || market_cap_usd < 0.0 {
            bail!("market cap for {:?} must be a non-negative number, got {}", name, market_cap_usd);
        }

        Ok(BankRecord {
            name: name.to_string(),
            market_cap_usd,
        })
    }
}

/// Parse "1,234.56" style figures (thousands separators removed)
pub fn parse_market_cap(raw: &str) -> Result<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .with_context(|| format!("market cap {:?} is not a number", raw.trim()))
}

// ============================================================================
// TABLE MATCHER
// ============================================================================

/// Matches a `<table>` whose class attribute contains every required token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMatcher {
    required_classes: Vec<String>,
}

impl TableMatcher {
    pub fn with_classes(classes: &[&str]) -> Self {
        TableMatcher {
            required_classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The market-capitalization table of the largest-banks page
    pub fn market_cap_table() -> Self {
        Self::with_classes(MARKET_CAP_TABLE_CLASSES)
    }

    /// Token order and extra classes don't matter
    pub fn matches_class_attr(&self, class_attr: Option<&str>) -> bool {
        let Some(attr) = class_attr else {
            return false;
        };
        let tokens: Vec<&str> = attr.split_whitespace().collect();
        self.required_classes
            .iter()
            .all(|required| tokens.contains(&required.as_str()))
    }

    pub fn matches(&self, table: &ElementRef) -> bool {
        table.value().name() == "table" && self.matches_class_attr(table.value().attr("class"))
    }
}

impl Default for TableMatcher {
    fn default() -> Self {
        Self::market_cap_table()
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

pub struct Extractor {
    matcher: TableMatcher,
    top_n: usize,
}

impl Extractor {
    pub fn new(matcher: TableMatcher, top_n: usize) -> Self {
        Extractor { matcher, top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Fetch `url` and parse its market-cap table
    pub fn extract(
        &self,
        source: &dyn DocumentSource,
        url: &str,
        log: &dyn ProgressLog,
    ) -> Result<Vec<BankRecord>, EtlError> {
        logged_stage(log, Stage::Extract, EXTRACT_MESSAGES, || {
            let html = source.fetch_text(url)?;
            self.parse_document(&html)
        })
    }

    /// Parse the first matching table of an HTML document.
    ///
    /// The first `<tr>` is the header. Only the first `top_n` body rows are
    /// read; rows among them with fewer than two `<td>` cells are skipped,
    /// so the result may hold fewer than `top_n` records.
    pub fn parse_document(&self, html: &str) -> Result<Vec<BankRecord>> {
        let document = Html::parse_document(html);
        let table_sel = selector("table")?;
        let row_sel = selector("tr")?;

        let table = document
            .select(&table_sel)
            .find(|t| self.matcher.matches(t))
            .ok_or_else(|| anyhow!("no table matching classes {:?}", self.matcher.required_classes))?;

        let mut records = Vec::with_capacity(self.top_n);

        for (index, row) in table.select(&row_sel).enumerate().skip(1).take(self.top_n) {
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| cell.value().name() == "td")
                .map(|cell| cell.text().collect::<String>())
                .collect();

            if cells.len() < 2 {
                tracing::debug!("skipping row {}: {} data cells", index, cells.len());
                continue;
            }

            let market_cap = parse_market_cap(&cells[1])
                .with_context(|| format!("Failed to parse row {}", index))?;
            let record = BankRecord::new(&cells[0], market_cap)
                .with_context(|| format!("Failed to parse row {}", index))?;

            records.push(record);
        }

        tracing::debug!("extracted {} bank records", records.len());
        Ok(records)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid CSS selector {:?}: {:?}", css, e))
}
