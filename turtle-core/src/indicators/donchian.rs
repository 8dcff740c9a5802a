//! Breakout channels: rolling extreme of highs or lows.
//!
//! The band at bar t covers bars t-period+1 through t, so it includes the
//! bar itself. The state machine compares a close against the band of the
//! bar before it.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    /// Highest high.
    Upper,
    /// Lowest low.
    Lower,
}

impl DonchianBand {
    fn source(self, bar: &Bar) -> f64 {
        match self {
            DonchianBand::Upper => bar.high,
            DonchianBand::Lower => bar.low,
        }
    }

    /// Extreme of one window, NaN if any member is undefined.
    fn extreme(self, window: &[Bar]) -> f64 {
        if window.iter().any(|bar| self.source(bar).is_nan()) {
            return f64::NAN;
        }
        let mut values = window.iter().map(|bar| self.source(bar));
        let first = values.next().unwrap_or(f64::NAN);
        values.fold(first, |acc, v| match self {
            DonchianBand::Upper => acc.max(v),
            DonchianBand::Lower => acc.min(v),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn upper(period: usize) -> Self {
        Self::with_band(period, DonchianBand::Upper)
    }

    pub fn lower(period: usize) -> Self {
        Self::with_band(period, DonchianBand::Lower)
    }

    /// A zero period is accepted and yields an all-NaN series.
    fn with_band(period: usize, band: DonchianBand) -> Self {
        let name = match band {
            DonchianBand::Upper => format!("channel_high_{period}"),
            DonchianBand::Lower => format!("channel_low_{period}"),
        };
        Self { period, band, name }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        if self.period == 0 {
            return vec![f64::NAN; bars.len()];
        }
        let warmup = self.lookback().min(bars.len());
        std::iter::repeat(f64::NAN)
            .take(warmup)
            .chain(bars.windows(self.period).map(|w| self.band.extreme(w)))
            .collect()
    }
}
