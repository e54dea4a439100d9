//! Synthetic data provider for offline runs and demos.
//!
//! Produces a random walk from a starting price of 100.0, weekdays only.
//! The walk is seeded from the symbol name, so the same symbol always gets
//! the same path regardless of the requested range. These series are
//! clearly fake and tagged `DataSource::Synthetic`.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{PricePoint, Symbol, SymbolSeries};
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// First date of every synthetic walk.
const WALK_ORIGIN: (i32, u32, u32) = (2000, 1, 3);

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let points = generate_walk(symbol, start, end);
        if points.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.clone(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            series: SymbolSeries::canonicalize(symbol.clone(), points),
            source: DataSource::Synthetic,
        })
    }
}

/// Walk from the origin date up to `end`, keeping points on or after `start`.
fn generate_walk(symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_str().as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let (y, m, d) = WALK_ORIGIN;
    let Some(mut current) = NaiveDate::from_ymd_opt(y, m, d) else {
        return Vec::new();
    };

    let mut points = Vec::new();
    let mut price = 100.0_f64;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            if current >= start {
                points.push(PricePoint {
                    date: current,
                    open: Some(open),
                    high: Some(high),
                    low: Some(low),
                    close,
                    volume: Some(volume),
                });
            }
            price = close;
        }
        current += chrono::Duration::days(1);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn skips_weekends() {
        let sym = Symbol::parse("SYN").unwrap();
        // 2024-01-06/07 is a weekend
        let result = SyntheticProvider.fetch(&sym, d(2024, 1, 1), d(2024, 1, 7)).unwrap();
        assert_eq!(result.series.len(), 5);
        assert_eq!(result.source, DataSource::Synthetic);
        assert!(result.series.points().iter().all(PricePoint::is_sane));
    }

    #[test]
    fn same_symbol_same_path_across_ranges() {
        let sym = Symbol::parse("SYN").unwrap();
        let wide = SyntheticProvider.fetch(&sym, d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let narrow = SyntheticProvider.fetch(&sym, d(2024, 1, 10), d(2024, 1, 12)).unwrap();
        let date = d(2024, 1, 11);
        let close_of = |s: &SymbolSeries| s.points().iter().find(|p| p.date == date).unwrap().close;
        assert_eq!(close_of(&wide.series), close_of(&narrow.series));
    }

    #[test]
    fn different_symbols_differ() {
        let a = SyntheticProvider
            .fetch(&Symbol::parse("AAA").unwrap(), d(2024, 1, 1), d(2024, 1, 31))
            .unwrap();
        let b = SyntheticProvider
            .fetch(&Symbol::parse("BBB").unwrap(), d(2024, 1, 1), d(2024, 1, 31))
            .unwrap();
        assert_ne!(a.series.closes(), b.series.closes());
    }

    #[test]
    fn weekend_only_range_is_no_data() {
        let sym = Symbol::parse("SYN").unwrap();
        let err = SyntheticProvider.fetch(&sym, d(2024, 1, 6), d(2024, 1, 7)).unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }
}
