//! Request configuration errors.
//!
//! Anything in here is fatal to a request and is raised before the first
//! fetch is attempted. Per-symbol problems are never `ConfigError`s; they are
//! collected into a `FetchReport` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no tickers given (example: AAPL, MSFT)")]
    EmptySymbolList,

    #[error("moving-average window must be a positive integer, got {0}")]
    InvalidWindow(i64),

    #[error("invalid {field} date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("source 'csv' requires a CSV path")]
    MissingCsvPath,

    #[error("unknown data source '{0}' (expected yahoo, csv or synthetic)")]
    UnknownSource(String),

    #[error("parse config: {0}")]
    Parse(String),

    #[error("read config: {0}")]
    Io(String),
}
