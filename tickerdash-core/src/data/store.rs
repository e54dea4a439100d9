//! SymbolHistoryStore: the never-failing fetch contract over a provider.
//!
//! `fetch` hands back an empty series on any failure (network, unknown
//! symbol, provider error) and logs the cause as a warning. `fetch_detailed`
//! keeps the error for failure reports and leaves the warning to its caller.

use super::provider::{DataError, DataProvider, DataSource};
use crate::domain::{Symbol, SymbolSeries};
use chrono::NaiveDate;

pub struct HistoryStore<P> {
    provider: P,
}

impl<P: DataProvider> HistoryStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch a symbol's history; empty on any failure.
    pub fn fetch(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> SymbolSeries {
        match self.fetch_detailed(symbol, start, end) {
            Ok((series, _)) => series,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    %symbol,
                    error = %e,
                    "fetch failed, treating as no data"
                );
                SymbolSeries::empty(symbol.clone())
            }
        }
    }

    /// Fetch a symbol's history, keeping the failure cause.
    ///
    /// Rows outside `[start, end]` are dropped, and a provider that returns
    /// nothing in range is reported as `DataError::NoData`.
    pub fn fetch_detailed(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(SymbolSeries, DataSource), DataError> {
        let result = self
            .provider
            .fetch(symbol, start, end)
            .and_then(|fetched| {
                let series = fetched.series.slice_dates(start, end);
                if series.is_empty() {
                    Err(DataError::NoData {
                        symbol: symbol.clone(),
                        start,
                        end,
                    })
                } else {
                    Ok((series, fetched.source))
                }
            });

        if let Err(e) = &result {
            tracing::debug!(provider = self.provider.name(), %symbol, error = %e, "fetch failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::FetchResult;
    use crate::domain::PricePoint;
    use std::sync::{Arc, Mutex};

    struct OneSymbol;

    impl DataProvider for OneSymbol {
        fn name(&self) -> &str {
            "one"
        }

        fn fetch(
            &self,
            symbol: &Symbol,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            if symbol.as_str() != "AAPL" {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.clone(),
                });
            }
            let points = (1..=5)
                .map(|d| {
                    PricePoint::close_only(NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), d as f64)
                })
                .collect();
            Ok(FetchResult {
                series: SymbolSeries::new(symbol.clone(), points).unwrap(),
                source: DataSource::Synthetic,
            })
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn unknown_symbol_is_empty_not_error() {
        let store = HistoryStore::new(OneSymbol);
        let series = store.fetch(&Symbol::parse("ZZZZ").unwrap(), d(1), d(5));
        assert!(series.is_empty());
        assert_eq!(series.symbol().as_str(), "ZZZZ");
    }

    #[test]
    fn result_is_clipped_to_range() {
        let store = HistoryStore::new(OneSymbol);
        let series = store.fetch(&Symbol::parse("AAPL").unwrap(), d(2), d(4));
        assert_eq!(series.len(), 3);
    }

    /// Run `f` with a WARN-level subscriber and return what it logged.
    fn warnings_from(f: impl FnOnce()) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&buf);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || SharedBuf(Arc::clone(&writer)))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn detailed_failure_leaves_warning_to_caller() {
        let store = HistoryStore::new(OneSymbol);
        let logged = warnings_from(|| {
            assert!(store
                .fetch_detailed(&Symbol::parse("ZZZZ").unwrap(), d(1), d(5))
                .is_err());
        });
        assert!(logged.is_empty(), "unexpected warning: {logged}");
    }

    #[test]
    fn plain_fetch_warns_once() {
        let store = HistoryStore::new(OneSymbol);
        let logged = warnings_from(|| {
            store.fetch(&Symbol::parse("ZZZZ").unwrap(), d(1), d(5));
        });
        assert_eq!(logged.matches("fetch failed").count(), 1);
        assert!(logged.contains("ZZZZ"));
    }

    #[test]
    fn empty_range_is_no_data() {
        let store = HistoryStore::new(OneSymbol);
        let err = store
            .fetch_detailed(&Symbol::parse("AAPL").unwrap(), d(10), d(20))
            .unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }
}
