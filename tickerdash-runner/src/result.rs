//! Dashboard result and per-symbol fetch report.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use tickerdash_core::data::{ComparisonTable, DataError, DataSource};
use tickerdash_core::domain::{Symbol, SymbolSeries};
use tickerdash_core::indicators::{IndicatedSeries, MaWindow};
use tickerdash_core::normalize::NormalizedSeries;
use tickerdash_core::returns::ReturnSummary;

/// Why a symbol produced no series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Provider had nothing for the symbol or range.
    NoData,
    /// Token is not a well-formed ticker.
    InvalidSymbol,
    /// Network, rate limit, format change and the like.
    Provider(String),
}

impl From<&DataError> for FailureReason {
    fn from(err: &DataError) -> Self {
        match err {
            DataError::NoData { .. } | DataError::SymbolNotFound { .. } => Self::NoData,
            other => Self::Provider(other.to_string()),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("no data"),
            Self::InvalidSymbol => f.write_str("invalid symbol"),
            Self::Provider(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolFailure {
    /// The token as the user typed it (after cleaning).
    pub symbol: String,
    pub reason: FailureReason,
}

/// Outcome of the fetch stage, one entry per requested token.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchReport {
    pub succeeded: Vec<Symbol>,
    pub failures: Vec<SymbolFailure>,
}

impl FetchReport {
    pub fn requested(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty()
    }

    /// Failed tokens, comma separated.
    pub fn failed_symbols(&self) -> String {
        self.failures
            .iter()
            .map(|f| f.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} symbols loaded",
            self.succeeded.len(),
            self.requested()
        )?;
        if !self.failures.is_empty() {
            write!(f, "; no data for: {}", self.failed_symbols())?;
        }
        Ok(())
    }
}

/// Everything one dashboard request produces.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResult {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub windows: Vec<MaWindow>,
    /// Successful series with their MA columns, in request order.
    pub indicated: Vec<IndicatedSeries>,
    pub normalized: Vec<NormalizedSeries>,
    /// Raw closes, outer-joined on date.
    pub comparison: ComparisonTable,
    /// Normalized closes, outer-joined on date.
    pub normalized_comparison: ComparisonTable,
    pub returns: ReturnSummary,
    pub sources: Vec<(Symbol, DataSource)>,
    pub report: FetchReport,
    /// BLAKE3 over every loaded point, in request order.
    pub dataset_hash: String,
}

impl DashboardResult {
    pub fn series(&self) -> impl Iterator<Item = &SymbolSeries> {
        self.indicated.iter().map(|i| &i.series)
    }

    pub fn has_synthetic(&self) -> bool {
        self.sources
            .iter()
            .any(|(_, source)| *source == DataSource::Synthetic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(symbol: &str, reason: FailureReason) -> SymbolFailure {
        SymbolFailure {
            symbol: symbol.to_string(),
            reason,
        }
    }

    #[test]
    fn report_summary_lists_failures() {
        let report = FetchReport {
            succeeded: vec![Symbol::parse("AAPL").unwrap()],
            failures: vec![
                failure("ZZZZ", FailureReason::NoData),
                failure("BAD!", FailureReason::InvalidSymbol),
            ],
        };
        assert_eq!(report.requested(), 3);
        assert!(!report.all_failed());
        assert_eq!(
            report.to_string(),
            "1 of 3 symbols loaded; no data for: ZZZZ, BAD!"
        );
    }

    #[test]
    fn unknown_symbol_is_no_data() {
        let err = DataError::SymbolNotFound {
            symbol: Symbol::parse("ZZZZ").unwrap(),
        };
        assert_eq!(FailureReason::from(&err), FailureReason::NoData);
        assert!(matches!(
            FailureReason::from(&DataError::RateLimited),
            FailureReason::Provider(_)
        ));
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let json = serde_json::to_string(&failure("X", FailureReason::Provider("boom".into())))
            .unwrap();
        assert_eq!(
            json,
            r#"{"symbol":"X","reason":{"kind":"provider","detail":"boom"}}"#
        );
    }
}
