//! Serializable dashboard request configuration.
//!
//! A `DashboardConfig` is what a user writes in a TOML file or passes as CLI
//! flags. `validate` turns it into a `DashboardRequest` whose symbols, dates
//! and windows are already checked, so nothing past this point raises a
//! `ConfigError`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tickerdash_core::data::{DEFAULT_TIMEOUT, DEFAULT_TTL};
use tickerdash_core::domain::{parse_symbol_list, SymbolList, DEFAULT_MAX_SYMBOLS};
use tickerdash_core::indicators::MaWindow;
use tickerdash_core::ConfigError;

/// Default moving-average windows.
pub const DEFAULT_WINDOWS: [i64; 3] = [20, 50, 200];

/// Default lookback when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Where price history comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "csv" => Ok(Self::Csv),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yahoo => "yahoo",
            Self::Csv => "csv",
            Self::Synthetic => "synthetic",
        })
    }
}

/// Raw request configuration, as read from TOML or CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Ticker tokens. Each entry may itself hold several comma- or
    /// space-separated tickers.
    pub symbols: Vec<String>,
    /// First date (inclusive). Defaults to a year before `end`.
    pub start: Option<NaiveDate>,
    /// Last date (inclusive). Defaults to today.
    pub end: Option<NaiveDate>,
    pub windows: Vec<i64>,
    pub max_symbols: usize,
    /// Parallel fetches.
    pub concurrency: usize,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
    pub source: SourceKind,
    pub csv_path: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            start: None,
            end: None,
            windows: DEFAULT_WINDOWS.to_vec(),
            max_symbols: DEFAULT_MAX_SYMBOLS,
            concurrency: 4,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            source: SourceKind::Yahoo,
            csv_path: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check everything and resolve defaults against `today`.
    ///
    /// An end date before the start date is accepted; every symbol then
    /// reports no data. A CSV source with no symbols means "every ticker in
    /// the file"; the runner fills them in once the file is read.
    pub fn validate(&self, today: NaiveDate) -> Result<DashboardRequest, ConfigError> {
        let raw = self.symbols.join(",");
        let no_tokens = raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .all(str::is_empty);
        let symbols = if self.source == SourceKind::Csv && no_tokens {
            SymbolList::default()
        } else {
            parse_symbol_list(&raw, self.max_symbols)?
        };
        let windows = MaWindow::parse_all(&self.windows)?;

        let end = self.end.unwrap_or(today);
        let start = self
            .start
            .unwrap_or(end - chrono::Duration::days(DEFAULT_LOOKBACK_DAYS));

        if self.source == SourceKind::Csv && self.csv_path.is_none() {
            return Err(ConfigError::MissingCsvPath);
        }

        Ok(DashboardRequest {
            symbols,
            start,
            end,
            windows,
            max_symbols: self.max_symbols,
            concurrency: self.concurrency.max(1),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            source: self.source,
            csv_path: self.csv_path.clone(),
        })
    }
}

/// Parse a `YYYY-MM-DD` date, naming the field on failure.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// A checked request, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub symbols: SymbolList,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub windows: Vec<MaWindow>,
    pub max_symbols: usize,
    pub concurrency: usize,
    pub cache_ttl: Duration,
    pub timeout: Duration,
    pub source: SourceKind,
    pub csv_path: Option<PathBuf>,
}

impl DashboardRequest {
    /// Default export file name: `stocks_<start>_<end>.csv`.
    pub fn export_file_name(&self) -> String {
        format!("stocks_{}_{}.csv", self.start, self.end)
    }
}
