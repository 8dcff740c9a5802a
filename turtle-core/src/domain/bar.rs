//! One daily trading session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLC bar. Dates are unique and strictly increasing within a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Why a single bar failed its sanity check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{field} is NaN")]
    Void { field: &'static str },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} = {value} lies outside the bar range [{low}, {high}]")]
    OutsideRange {
        field: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: 0,
        }
    }

    fn prices(&self) -> [(&'static str, f64); 4] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
    }

    /// Positive prices with `low <= open, close <= high`.
    pub fn check(&self) -> Result<(), BarError> {
        for (field, value) in self.prices() {
            if value.is_nan() {
                return Err(BarError::Void { field });
            }
            if value <= 0.0 || !value.is_finite() {
                return Err(BarError::NonPositive { field, value });
            }
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(BarError::OutsideRange {
                    field,
                    value,
                    low: self.low,
                    high: self.high,
                });
            }
        }
        Ok(())
    }
}
