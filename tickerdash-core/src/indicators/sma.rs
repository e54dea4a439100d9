//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a trailing window, current point
//! included. Lookback: window - 1 (first defined value at index window-1).

use super::{Indicator, MaWindow};
use crate::domain::PricePoint;

#[derive(Debug, Clone)]
pub struct Sma {
    window: MaWindow,
    name: String,
}

impl Sma {
    pub fn new(window: MaWindow) -> Self {
        Self {
            window,
            name: window.column_name(),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.get().saturating_sub(1)
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<Option<f64>> {
        let period = self.window.get();
        let n = points.len();
        let mut result = vec![None; n];

        if n < period {
            return result;
        }

        // Running sum over the defined closes in the window plus a count of
        // undefined ones. A window holding any undefined close has no mean.
        let mut sum = 0.0;
        let mut missing = 0usize;

        for (i, point) in points.iter().enumerate() {
            match point.close_value() {
                Some(c) => sum += c,
                None => missing += 1,
            }

            if i >= period {
                match points[i - period].close_value() {
                    Some(c) => sum -= c,
                    None => missing -= 1,
                }
            }

            if i + 1 >= period && missing == 0 {
                result[i] = Some(sum / period as f64);
            }
        }

        result
    }
}
