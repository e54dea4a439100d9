//! PricePoint: one OHLCV row for one symbol on one day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV row. Only `close` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

impl PricePoint {
    /// Row with only a close price.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// Close as a defined value. NaN and infinities count as missing.
    pub fn close_value(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }

    /// Returns true if open, high, low and close are all present and finite.
    pub fn has_full_ohlc(&self) -> bool {
        [self.open, self.high, self.low]
            .iter()
            .all(|v| v.is_some_and(f64::is_finite))
            && self.close.is_finite()
    }

    /// Basic sanity check: high >= low and open/close within the range.
    ///
    /// Rows without a full OHLC set are not checked and count as sane.
    pub fn is_sane(&self) -> bool {
        match (self.open, self.high, self.low) {
            (Some(open), Some(high), Some(low)) if self.has_full_ohlc() => {
                high >= low
                    && open <= high
                    && open >= low
                    && self.close <= high
                    && self.close >= low
            }
            _ => true,
        }
    }
}
