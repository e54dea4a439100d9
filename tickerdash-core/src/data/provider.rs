//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV
//! import, synthetic walks) so they can be swapped and mocked in tests. The
//! cache wraps a provider; providers don't know about the cache.

use crate::domain::{Symbol, SymbolSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Structured error types for data operations.
///
/// Displayable in CLI output and in the per-symbol failure report.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: Symbol },

    #[error("no data for {symbol} between {start} and {end}")]
    NoData {
        symbol: Symbol,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("csv import: {0}")]
    Csv(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub series: SymbolSeries,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Trait for data providers (Yahoo Finance, CSV import, etc).
///
/// Implementations must be safe to call from several threads at once.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV rows for a symbol over an inclusive date range.
    ///
    /// An empty result is reported as `DataError::NoData`, never as an empty
    /// `Ok` series.
    fn fetch(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}

macro_rules! forward_provider {
    ($ptr:ident) => {
        impl<P: DataProvider + ?Sized> DataProvider for $ptr<P> {
            fn name(&self) -> &str {
                (**self).name()
            }

            fn fetch(
                &self,
                symbol: &Symbol,
                start: NaiveDate,
                end: NaiveDate,
            ) -> Result<FetchResult, DataError> {
                (**self).fetch(symbol, start, end)
            }
        }
    };
}

forward_provider!(Arc);
forward_provider!(Box);

/// Progress callback for multi-symbol operations.
///
/// Fetches may run in parallel, so callbacks can arrive out of order and
/// from several threads.
pub trait FetchProgress: Send + Sync {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &Symbol, index: usize, total: usize);

    /// Called when a symbol fetch completes.
    fn on_complete(
        &self,
        symbol: &Symbol,
        index: usize,
        total: usize,
        result: &Result<(), DataError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits `tracing` events.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, symbol: &Symbol, index: usize, total: usize) {
        tracing::info!(%symbol, "[{}/{}] fetching", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &Symbol,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => tracing::debug!(%symbol, "fetch ok"),
            Err(e) => tracing::warn!(%symbol, error = %e, "no data"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "fetch batch complete");
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _symbol: &Symbol, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _symbol: &Symbol,
        _index: usize,
        _total: usize,
        _result: &Result<(), DataError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
