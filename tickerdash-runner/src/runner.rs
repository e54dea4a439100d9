//! Dashboard runner: fetch every symbol, then run the transforms.
//!
//! Two entry points:
//! - `open_provider()`: builds the data source a request asks for.
//! - `run_dashboard()`: fetches on a bounded thread pool, collects the
//!   per-symbol report and derives every table. Used by the CLI.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

use tickerdash_core::data::{
    align, align_normalized, CachedProvider, CsvProvider, DataError, DataProvider, DataSource,
    FetchProgress, HistoryStore, SyntheticProvider, YahooProvider,
};
use tickerdash_core::domain::{Symbol, SymbolSeries};
use tickerdash_core::indicators::add_moving_averages_batch;
use tickerdash_core::normalize::normalize_batch;
use tickerdash_core::returns::compute_returns;
use tickerdash_core::ConfigError;

use crate::config::{DashboardRequest, SourceKind};
use crate::result::{DashboardResult, FailureReason, FetchReport, SymbolFailure};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data source unavailable: {0}")]
    Source(#[from] DataError),
    #[error("no data for any requested symbol ({report})")]
    NoSymbolsSucceeded { report: FetchReport },
    #[error("failed to build fetch thread pool: {0}")]
    ThreadPool(String),
}

/// Build the provider for a request.
///
/// Yahoo is wrapped in the in-memory TTL cache. A CSV file is read once here;
/// when the request named no symbols, every ticker in the file is used (up to
/// the symbol cap).
pub fn open_provider(req: &mut DashboardRequest) -> Result<Box<dyn DataProvider>, RunError> {
    let provider: Box<dyn DataProvider> = match req.source {
        SourceKind::Yahoo => Box::new(CachedProvider::with_ttl(
            YahooProvider::new(req.timeout)?,
            req.cache_ttl,
        )),
        SourceKind::Csv => {
            let path = req.csv_path.as_deref().ok_or(ConfigError::MissingCsvPath)?;
            let csv = CsvProvider::from_path(path, None)?;
            if req.symbols.symbols.is_empty() && req.symbols.rejected.is_empty() {
                req.symbols.symbols = csv.symbols().iter().take(req.max_symbols).cloned().collect();
                tracing::info!(
                    path = %path.display(),
                    symbols = req.symbols.symbols.len(),
                    "using every ticker in the CSV file"
                );
            }
            Box::new(csv)
        }
        SourceKind::Synthetic => Box::new(SyntheticProvider::new()),
    };
    Ok(provider)
}

type Fetched = (Symbol, Result<(SymbolSeries, DataSource), DataError>);

/// Fetch every symbol on a pool of at most `concurrency` threads.
///
/// Results come back in input order regardless of completion order.
pub fn fetch_all<P: DataProvider>(
    store: &HistoryStore<P>,
    symbols: &[Symbol],
    start: NaiveDate,
    end: NaiveDate,
    concurrency: usize,
    progress: &dyn FetchProgress,
) -> Result<Vec<Fetched>, RunError> {
    let total = symbols.len();
    let threads = concurrency.clamp(1, total.max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| RunError::ThreadPool(e.to_string()))?;

    let fetched: Vec<Fetched> = pool.install(|| {
        symbols
            .par_iter()
            .enumerate()
            .map(|(i, symbol)| {
                progress.on_start(symbol, i, total);
                let result = store.fetch_detailed(symbol, start, end);
                let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
                progress.on_complete(symbol, i, total, &outcome);
                (symbol.clone(), result)
            })
            .collect()
    });

    Ok(fetched)
}

/// Run one dashboard request end to end.
///
/// Per-symbol failures land in the report; the request only fails when no
/// symbol produced data. Each ticker appears once in every output, in the
/// order it was first requested.
pub fn run_dashboard<P: DataProvider>(
    req: &DashboardRequest,
    store: &HistoryStore<P>,
    progress: &dyn FetchProgress,
) -> Result<DashboardResult, RunError> {
    if req.symbols.symbols.is_empty() && req.symbols.rejected.is_empty() {
        return Err(ConfigError::EmptySymbolList.into());
    }

    let mut report = FetchReport::default();
    for (token, err) in &req.symbols.rejected {
        tracing::warn!(token = %token, error = %err, "skipping invalid ticker");
        report.failures.push(SymbolFailure {
            symbol: token.clone(),
            reason: FailureReason::InvalidSymbol,
        });
    }

    // a repeated ticker keeps its first position only
    let mut seen = HashSet::new();
    let symbols: Vec<Symbol> = req
        .symbols
        .symbols
        .iter()
        .filter(|s| seen.insert(*s))
        .cloned()
        .collect();
    if symbols.len() < req.symbols.symbols.len() {
        tracing::debug!(
            requested = req.symbols.symbols.len(),
            unique = symbols.len(),
            "dropping repeated tickers"
        );
    }

    let fetched = fetch_all(
        store,
        &symbols,
        req.start,
        req.end,
        req.concurrency,
        progress,
    )?;

    let mut series = Vec::with_capacity(fetched.len());
    let mut sources = Vec::with_capacity(fetched.len());
    for (symbol, result) in fetched {
        match result {
            Ok((s, source)) => {
                report.succeeded.push(symbol.clone());
                sources.push((symbol, source));
                series.push(s);
            }
            Err(e) => report.failures.push(SymbolFailure {
                symbol: symbol.to_string(),
                reason: FailureReason::from(&e),
            }),
        }
    }

    progress.on_batch_complete(report.succeeded.len(), report.failures.len(), report.requested());

    if report.all_failed() {
        return Err(RunError::NoSymbolsSucceeded { report });
    }

    // duplicate windows collapse to one column
    let mut windows = req.windows.clone();
    windows.sort_unstable();
    windows.dedup();

    let normalized = normalize_batch(&series);
    let normalized_comparison = align_normalized(&normalized);

    Ok(DashboardResult {
        start: req.start,
        end: req.end,
        indicated: add_moving_averages_batch(&series, &windows),
        windows,
        comparison: align(&series),
        returns: compute_returns(&series),
        dataset_hash: compute_dataset_hash(&series),
        normalized,
        normalized_comparison,
        sources,
        report,
    })
}

/// Deterministic BLAKE3 hash over the loaded series, in request order.
pub fn compute_dataset_hash(series: &[SymbolSeries]) -> String {
    let mut hasher = blake3::Hasher::new();

    for s in series {
        hasher.update(s.symbol().as_str().as_bytes());
        for p in s.points() {
            hasher.update(p.date.to_string().as_bytes());
            for v in [p.open, p.high, p.low] {
                hasher.update(&v.unwrap_or(f64::NAN).to_le_bytes());
            }
            hasher.update(&p.close.to_le_bytes());
            hasher.update(&p.volume.unwrap_or(0).to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}
