//! Multi-symbol time alignment.
//!
//! Outer-joins several symbols on date: every date present for any symbol
//! gets a row, and a symbol without a value on that date leaves its cell
//! undefined. There is no forward or back fill. Rows where every cell is
//! undefined are dropped.

use crate::domain::{Symbol, SymbolSeries};
use crate::normalize::NormalizedSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// One date of a comparison table. `values` follows the table's symbol order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Wide table: one date column, one value column per symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonTable {
    /// Column order (first occurrence of each supplied symbol).
    pub symbols: Vec<Symbol>,
    /// Rows sorted ascending by date.
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Cell lookup. `None` when the date, the symbol or the value is missing.
    pub fn get(&self, date: NaiveDate, symbol: &Symbol) -> Option<f64> {
        let col = self.symbols.iter().position(|s| s == symbol)?;
        let row = self
            .rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])?;
        row.values[col]
    }

    /// Whole column for one symbol, one entry per row.
    pub fn column(&self, symbol: &Symbol) -> Option<Vec<Option<f64>>> {
        let col = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.rows.iter().map(|r| r.values[col]).collect())
    }
}

/// Align closing prices of several symbols.
pub fn align(series: &[SymbolSeries]) -> ComparisonTable {
    align_columns(series.iter().map(|s| {
        let values: DatedColumn = s.points().iter().map(|p| (p.date, p.close_value())).collect();
        (s.symbol(), values)
    }))
}

/// Align normalized (first close = 100) values of several symbols.
pub fn align_normalized(series: &[NormalizedSeries]) -> ComparisonTable {
    align_columns(series.iter().map(|n| {
        let values: DatedColumn = n
            .series
            .points()
            .iter()
            .zip(&n.close_norm)
            .map(|(p, v)| (p.date, *v))
            .collect();
        (n.series.symbol(), values)
    }))
}

type DatedColumn = Vec<(NaiveDate, Option<f64>)>;

fn align_columns<'a>(columns: impl Iterator<Item = (&'a Symbol, DatedColumn)>) -> ComparisonTable {
    // Keep the first column supplied for each symbol
    let mut seen: HashSet<&Symbol> = HashSet::new();
    let columns: Vec<(&Symbol, DatedColumn)> =
        columns.filter(|(sym, _)| seen.insert(*sym)).collect();

    let width = columns.len();
    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();

    for (col, (_, values)) in columns.iter().enumerate() {
        for &(date, value) in values {
            by_date.entry(date).or_insert_with(|| vec![None; width])[col] = value;
        }
    }

    let rows = by_date
        .into_iter()
        .filter(|(_, values)| values.iter().any(Option::is_some))
        .map(|(date, values)| ComparisonRow { date, values })
        .collect();

    ComparisonTable {
        symbols: columns.into_iter().map(|(sym, _)| sym.clone()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;
    use crate::normalize::normalize_batch;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn series(symbol: &str, rows: &[(u32, f64)]) -> SymbolSeries {
        SymbolSeries::new(
            sym(symbol),
            rows.iter()
                .map(|&(day, close)| PricePoint::close_only(d(day), close))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_input_is_empty_table() {
        let table = align(&[]);
        assert!(table.is_empty());
        assert!(table.symbols.is_empty());
    }

    #[test]
    fn single_symbol_one_row_per_date() {
        let table = align(&[series("SPY", &[(2, 100.0), (3, 101.0)])]);
        assert_eq!(table.symbols, vec![sym("SPY")]);
        assert_eq!(table.dates(), vec![d(2), d(3)]);
        assert_eq!(table.get(d(3), &sym("SPY")), Some(101.0));
    }

    #[test]
    fn outer_join_leaves_gaps_undefined() {
        let a = series("A", &[(1, 10.0), (2, 11.0), (3, 12.0)]);
        let b = series("B", &[(2, 20.0), (3, 21.0), (4, 22.0)]);
        let table = align(&[a, b]);

        assert_eq!(table.dates(), vec![d(1), d(2), d(3), d(4)]);
        assert_eq!(table.get(d(4), &sym("A")), None);
        assert_eq!(table.get(d(1), &sym("B")), None);
        assert_eq!(table.get(d(1), &sym("A")), Some(10.0));
        assert_eq!(table.get(d(4), &sym("B")), Some(22.0));
        assert_eq!(table.rows[0].values, vec![Some(10.0), None]);
    }

    #[test]
    fn columns_follow_input_order_and_dedupe() {
        let table = align(&[
            series("MSFT", &[(2, 1.0)]),
            series("AAPL", &[(2, 2.0)]),
            series("MSFT", &[(2, 99.0), (5, 99.0)]),
        ]);
        assert_eq!(table.symbols, vec![sym("MSFT"), sym("AAPL")]);
        assert_eq!(table.get(d(2), &sym("MSFT")), Some(1.0));
        // the duplicate's extra date never shows up
        assert_eq!(table.dates(), vec![d(2)]);
    }

    #[test]
    fn all_undefined_rows_are_dropped() {
        let a = series("A", &[(1, f64::NAN), (2, 10.0)]);
        let b = series("B", &[(2, 20.0)]);
        let table = align(&[a, b]);
        assert_eq!(table.dates(), vec![d(2)]);
    }

    #[test]
    fn partial_rows_are_kept() {
        let a = series("A", &[(1, f64::NAN), (2, 10.0)]);
        let b = series("B", &[(1, 5.0)]);
        let table = align(&[a, b]);
        assert_eq!(table.dates(), vec![d(1), d(2)]);
        assert_eq!(table.rows[0].values, vec![None, Some(5.0)]);
    }

    #[test]
    fn normalized_alignment() {
        let normalized = normalize_batch(&[
            series("A", &[(1, 50.0), (2, 100.0)]),
            series("B", &[(2, 4.0), (3, 2.0)]),
        ]);
        let table = align_normalized(&normalized);
        assert_eq!(table.column(&sym("A")).unwrap(), vec![Some(100.0), Some(200.0), None]);
        assert_eq!(table.column(&sym("B")).unwrap(), vec![None, Some(100.0), Some(50.0)]);
    }
}
