//! Simple percentage return per symbol: `(close[last] / close[first] - 1) * 100`.

use crate::domain::{Symbol, SymbolSeries};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnEntry {
    pub symbol: Symbol,
    /// Percentage return; `None` for a degenerate series.
    pub return_pct: Option<f64>,
}

/// Returns for a batch of symbols, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnSummary {
    pub entries: Vec<ReturnEntry>,
}

impl ReturnSummary {
    /// Return for a symbol. Outer `None`: symbol not in the batch.
    pub fn get(&self, symbol: &Symbol) -> Option<Option<f64>> {
        self.entries
            .iter()
            .find(|e| &e.symbol == symbol)
            .map(|e| e.return_pct)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols whose return could not be computed.
    pub fn degenerate(&self) -> impl Iterator<Item = &Symbol> {
        self.entries
            .iter()
            .filter(|e| e.return_pct.is_none())
            .map(|e| &e.symbol)
    }
}

/// Return of one series. Needs at least two points, a non-zero defined
/// first close and a defined last close.
pub fn simple_return(series: &SymbolSeries) -> Option<f64> {
    let points = series.points();
    if points.len() < 2 {
        return None;
    }
    let first = points.first()?.close_value().filter(|&c| c != 0.0)?;
    let last = points.last()?.close_value()?;
    Some((last / first - 1.0) * 100.0)
}

pub fn compute_returns(series: &[SymbolSeries]) -> ReturnSummary {
    ReturnSummary {
        entries: series
            .iter()
            .map(|s| ReturnEntry {
                symbol: s.symbol().clone(),
                return_pct: simple_return(s),
            })
            .collect(),
    }
}
