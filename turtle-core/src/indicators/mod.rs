//! Indicator engine: volatility and breakout channels.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! whole table is computed once before the state machine runs; rolling
//! windows need the full history, so there is no streaming path.

pub mod atr;
pub mod donchian;

pub use atr::Atr;
pub use donchian::{Donchian, DonchianBand};

use crate::config::TurtleConfig;
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trait for single-series indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`; the first
/// `lookback()` values are `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bar t+1 or later. Truncating the input
/// series must leave every overlapping output unchanged.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "atr_14").
    fn name(&self) -> &str;

    /// Number of leading NaN values.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// One bar's derived values, keyed by the source bar's date.
///
/// Undefined values (warm-up) are `f64::NAN`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub atr: f64,
    pub entry_long: f64,
    pub entry_short: f64,
    pub exit_long: f64,
    pub exit_short: f64,
}

impl IndicatorRow {
    /// All four channel values are defined.
    pub fn channels_ready(&self) -> bool {
        [
            self.entry_long,
            self.entry_short,
            self.exit_long,
            self.exit_short,
        ]
        .iter()
        .all(|v| !v.is_nan())
    }

    /// Bitwise comparison, so two undefined values compare equal.
    pub fn same_as(&self, other: &IndicatorRow) -> bool {
        self.date == other.date
            && [
                (self.close, other.close),
                (self.atr, other.atr),
                (self.entry_long, other.entry_long),
                (self.entry_short, other.entry_short),
                (self.exit_long, other.exit_long),
                (self.exit_short, other.exit_short),
            ]
            .iter()
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Compute the indicator table for a bar series.
///
/// Channel windows follow `config.mode`. Output is aligned with `bars`,
/// one row per bar. Pure: same input, same output.
pub fn compute_indicators(bars: &[Bar], config: &TurtleConfig) -> Vec<IndicatorRow> {
    let entry = config.entry_window();
    let exit = config.exit_window();

    let atr = Atr::new(config.atr_period).compute(bars);
    let entry_long = Donchian::upper(entry).compute(bars);
    let entry_short = Donchian::lower(entry).compute(bars);
    let exit_long = Donchian::lower(exit).compute(bars);
    let exit_short = Donchian::upper(exit).compute(bars);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            date: bar.date,
            close: bar.close,
            atr: atr[i],
            entry_long: entry_long[i],
            entry_short: entry_short[i],
            exit_long: exit_long[i],
            exit_short: exit_short[i],
        })
        .collect()
}

/// Build bars from explicit (open, high, low, close) tuples, one day apart.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
            )
        })
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
