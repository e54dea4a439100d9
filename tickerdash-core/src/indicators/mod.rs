//! Moving-average indicator engine.
//!
//! Indicators are pure functions: one symbol's history in, one value per
//! point out. Undefined values (warmup, or a window touching an undefined
//! close) are `None`, never zero and never extrapolated.

pub mod sma;

pub use sma::Sma;

use crate::domain::{PricePoint, SymbolSeries};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;

/// Trait for single-series indicators.
///
/// No value at index t may depend on points after t.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "SMA_20").
    fn name(&self) -> &str;

    /// Number of points needed before the indicator produces a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator over a whole series.
    ///
    /// Returns a `Vec` of the same length as `points`; the first
    /// `lookback()` entries are `None`.
    fn compute(&self, points: &[PricePoint]) -> Vec<Option<f64>>;
}

/// Validated moving-average window size (a positive integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct MaWindow(NonZeroUsize);

impl MaWindow {
    /// Validate a window size. Zero and negatives are configuration errors.
    pub fn new(value: i64) -> Result<Self, ConfigError> {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(ConfigError::InvalidWindow(value))
    }

    /// Validate a whole list, failing on the first bad entry.
    pub fn parse_all(values: &[i64]) -> Result<Vec<Self>, ConfigError> {
        values.iter().map(|&v| Self::new(v)).collect()
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Export column name, `SMA_<window>`.
    pub fn column_name(self) -> String {
        format!("SMA_{}", self.0)
    }
}

impl fmt::Display for MaWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for MaWindow {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaWindow> for u64 {
    fn from(value: MaWindow) -> Self {
        value.get() as u64
    }
}

/// A series plus one moving-average column per requested window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatedSeries {
    pub series: SymbolSeries,
    pub moving_averages: BTreeMap<MaWindow, Vec<Option<f64>>>,
}

impl IndicatedSeries {
    /// MA column for a window, if it was requested.
    pub fn ma(&self, window: MaWindow) -> Option<&[Option<f64>]> {
        self.moving_averages.get(&window).map(Vec::as_slice)
    }

    /// Requested windows in ascending order.
    pub fn windows(&self) -> impl Iterator<Item = MaWindow> + '_ {
        self.moving_averages.keys().copied()
    }
}

/// Add one SMA column per distinct window.
///
/// Windows are independent of each other; a window longer than the series
/// yields an all-`None` column.
pub fn add_moving_averages(series: &SymbolSeries, windows: &[MaWindow]) -> IndicatedSeries {
    let moving_averages = windows
        .iter()
        .map(|&w| (w, Sma::new(w).compute(series.points())))
        .collect();

    IndicatedSeries {
        series: series.clone(),
        moving_averages,
    }
}

/// Apply [`add_moving_averages`] to each symbol on its own.
pub fn add_moving_averages_batch(
    series: &[SymbolSeries],
    windows: &[MaWindow],
) -> Vec<IndicatedSeries> {
    series
        .iter()
        .map(|s| add_moving_averages(s, windows))
        .collect()
}

/// Build close-only points from close prices, one per day from 2024-01-02.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::close_only(base_date + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Symbol;

    fn series(symbol: &str, closes: &[f64]) -> SymbolSeries {
        SymbolSeries::new(Symbol::parse(symbol).unwrap(), make_points(closes)).unwrap()
    }

    fn w(v: i64) -> MaWindow {
        MaWindow::new(v).unwrap()
    }

    #[test]
    fn window_rejects_zero_and_negative() {
        assert!(matches!(MaWindow::new(0), Err(ConfigError::InvalidWindow(0))));
        assert!(matches!(MaWindow::new(-5), Err(ConfigError::InvalidWindow(-5))));
        assert_eq!(MaWindow::new(7).unwrap().get(), 7);
    }

    #[test]
    fn parse_all_stops_on_bad_window() {
        assert!(MaWindow::parse_all(&[7, 30]).is_ok());
        assert!(matches!(
            MaWindow::parse_all(&[7, 0, 30]),
            Err(ConfigError::InvalidWindow(0))
        ));
    }

    #[test]
    fn window_serde() {
        let win: MaWindow = serde_json::from_str("20").unwrap();
        assert_eq!(win.get(), 20);
        assert!(serde_json::from_str::<MaWindow>("0").is_err());
        assert_eq!(serde_json::to_string(&win).unwrap(), "20");
    }

    #[test]
    fn windows_are_independent_columns() {
        let s = series("AAPL", &[1.0, 2.0, 3.0, 4.0]);
        let indicated = add_moving_averages(&s, &[w(2), w(3)]);
        assert_eq!(indicated.moving_averages.len(), 2);
        assert_eq!(
            indicated.ma(w(2)).unwrap(),
            &[None, Some(1.5), Some(2.5), Some(3.5)]
        );
        assert_eq!(indicated.ma(w(3)).unwrap(), &[None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn duplicate_windows_collapse() {
        let s = series("AAPL", &[1.0, 2.0]);
        let indicated = add_moving_averages(&s, &[w(2), w(2)]);
        assert_eq!(indicated.windows().collect::<Vec<_>>(), vec![w(2)]);
    }

    #[test]
    fn long_window_is_all_undefined() {
        let s = series("AAPL", &[1.0, 2.0, 3.0]);
        let indicated = add_moving_averages(&s, &[w(10)]);
        assert!(indicated.ma(w(10)).unwrap().iter().all(Option::is_none));
    }

    #[test]
    fn batch_keeps_symbols_apart() {
        let aapl = series("AAPL", &[100.0, 105.0, 110.0]);
        let msft = series("MSFT", &[50.0, 45.0, 55.0]);
        let out = add_moving_averages_batch(&[aapl, msft], &[w(2)]);

        assert_eq!(out[0].ma(w(2)).unwrap(), &[None, Some(102.5), Some(107.5)]);
        // MSFT's first value stays undefined even though AAPL precedes it
        assert_eq!(out[1].ma(w(2)).unwrap(), &[None, Some(47.5), Some(50.0)]);
    }

    #[test]
    fn source_series_is_untouched() {
        let s = series("AAPL", &[1.0, 2.0]);
        let before = s.clone();
        let indicated = add_moving_averages(&s, &[w(1)]);
        assert_eq!(s, before);
        assert_eq!(indicated.series, before);
    }
}
