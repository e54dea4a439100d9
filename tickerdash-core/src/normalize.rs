//! Normalization to 100 for cross-symbol comparison.
//!
//! `close_norm[i] = close[i] / close[0] * 100`. A series whose first close is
//! zero or undefined (or an empty series) has no anchor, and every
//! normalized value is `None`.

use crate::domain::SymbolSeries;
use serde::Serialize;

/// A series plus its closes rescaled so the first one is 100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub series: SymbolSeries,
    pub close_norm: Vec<Option<f64>>,
}

impl NormalizedSeries {
    /// Whether the series had a usable anchor.
    pub fn is_anchored(&self) -> bool {
        self.close_norm.first().is_some_and(Option::is_some)
    }
}

pub fn normalize_to_hundred(series: &SymbolSeries) -> NormalizedSeries {
    let anchor = series
        .points()
        .first()
        .and_then(|p| p.close_value())
        .filter(|&c| c != 0.0);

    let close_norm = match anchor {
        Some(first) => series
            .points()
            .iter()
            .map(|p| p.close_value().map(|c| c / first * 100.0))
            .collect(),
        None => vec![None; series.len()],
    };

    NormalizedSeries {
        series: series.clone(),
        close_norm,
    }
}

/// Apply [`normalize_to_hundred`] to each symbol on its own.
pub fn normalize_batch(series: &[SymbolSeries]) -> Vec<NormalizedSeries> {
    series.iter().map(normalize_to_hundred).collect()
}
