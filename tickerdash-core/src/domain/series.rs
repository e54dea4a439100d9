//! SymbolSeries: the canonical per-symbol history every engine consumes.

use super::price::PricePoint;
use super::symbol::Symbol;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{symbol}: dates must be strictly increasing ({previous} then {next})")]
    UnorderedDates {
        symbol: Symbol,
        previous: NaiveDate,
        next: NaiveDate,
    },
}

/// Date-ordered price history for exactly one symbol.
///
/// Dates are strictly increasing. Fields are private so the invariant holds
/// for every value in circulation; transforms build new derived values
/// rather than mutating a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSeries {
    symbol: Symbol,
    points: Vec<PricePoint>,
}

impl SymbolSeries {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(symbol: Symbol, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if let Some(w) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(SeriesError::UnorderedDates {
                symbol,
                previous: w[0].date,
                next: w[1].date,
            });
        }
        Ok(Self { symbol, points })
    }

    /// Build a series from rows in any order: sort by date, keep the first
    /// row seen for each date.
    pub fn canonicalize(symbol: Symbol, mut points: Vec<PricePoint>) -> Self {
        // stable sort keeps input order among equal dates
        points.sort_by_key(|p| p.date);
        points.dedup_by(|later, earlier| later.date == earlier.date);
        Self { symbol, points }
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Close prices with non-finite values mapped to `None`.
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.points.iter().map(PricePoint::close_value).collect()
    }

    /// Sub-series with dates in `[start, end]` (inclusive).
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .cloned()
                .collect(),
        }
    }
}

/// One row of a long-format table that mixes several symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRow {
    pub symbol: Symbol,
    pub point: PricePoint,
}

/// Partition long-format rows by symbol.
///
/// Groups come out in order of each symbol's first appearance; within a group
/// rows are canonicalized (sorted by date, duplicate dates keep the first
/// row). Rows of one symbol never end up in another symbol's series.
pub fn group_by_symbol(rows: Vec<TickerRow>) -> Vec<SymbolSeries> {
    let mut order: Vec<Symbol> = Vec::new();
    let mut groups: HashMap<Symbol, Vec<PricePoint>> = HashMap::new();

    for row in rows {
        let entry = groups.entry(row.symbol.clone()).or_insert_with(|| {
            order.push(row.symbol.clone());
            Vec::new()
        });
        entry.push(row.point);
    }

    order
        .into_iter()
        .map(|sym| {
            let points = groups.remove(&sym).unwrap_or_default();
            SymbolSeries::canonicalize(sym, points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[test]
    fn new_accepts_increasing_dates() {
        let s = SymbolSeries::new(
            sym("AAPL"),
            vec![
                PricePoint::close_only(d(2), 1.0),
                PricePoint::close_only(d(3), 2.0),
            ],
        )
        .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.first_date(), Some(d(2)));
        assert_eq!(s.last_date(), Some(d(3)));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let err = SymbolSeries::new(
            sym("AAPL"),
            vec![
                PricePoint::close_only(d(2), 1.0),
                PricePoint::close_only(d(2), 2.0),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedDates { .. }));
    }

    #[test]
    fn new_rejects_descending_dates() {
        assert!(SymbolSeries::new(
            sym("AAPL"),
            vec![
                PricePoint::close_only(d(3), 1.0),
                PricePoint::close_only(d(2), 2.0),
            ],
        )
        .is_err());
    }

    #[test]
    fn canonicalize_sorts_and_keeps_first_duplicate() {
        let s = SymbolSeries::canonicalize(
            sym("AAPL"),
            vec![
                PricePoint::close_only(d(4), 4.0),
                PricePoint::close_only(d(2), 2.0),
                PricePoint::close_only(d(4), 40.0),
                PricePoint::close_only(d(3), 3.0),
            ],
        );
        let closes: Vec<f64> = s.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn slice_is_inclusive() {
        let s = SymbolSeries::canonicalize(
            sym("AAPL"),
            (2..=6).map(|i| PricePoint::close_only(d(i), i as f64)).collect(),
        );
        let sliced = s.slice_dates(d(3), d(5));
        assert_eq!(sliced.len(), 3);
        assert_eq!(sliced.first_date(), Some(d(3)));
        assert_eq!(sliced.last_date(), Some(d(5)));
    }

    #[test]
    fn grouping_never_mixes_symbols() {
        let rows = vec![
            TickerRow { symbol: sym("MSFT"), point: PricePoint::close_only(d(3), 50.0) },
            TickerRow { symbol: sym("AAPL"), point: PricePoint::close_only(d(2), 100.0) },
            TickerRow { symbol: sym("MSFT"), point: PricePoint::close_only(d(2), 45.0) },
            TickerRow { symbol: sym("AAPL"), point: PricePoint::close_only(d(3), 105.0) },
        ];
        let groups = group_by_symbol(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].symbol().as_str(), "MSFT");
        assert_eq!(groups[0].closes(), vec![Some(45.0), Some(50.0)]);
        assert_eq!(groups[1].symbol().as_str(), "AAPL");
        assert_eq!(groups[1].closes(), vec![Some(100.0), Some(105.0)]);
    }
}
