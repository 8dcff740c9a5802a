//! Average True Range, the turtle "N".
//!
//! The first bar has no previous close, so its true range is its high-low
//! span. The average is seeded with the plain mean of the first `period`
//! true ranges (value at index `period - 1`) and then smoothed Wilder style:
//!
//! ```text
//! atr[t] = ((period - 1) * atr[t-1] + tr[t]) / period
//! ```

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    /// A zero period is accepted and yields an all-NaN series.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range of `bar` given the bar before it, if any.
///
/// NaN when any input it reads is NaN (`f64::max` would otherwise hide one).
pub fn bar_true_range(prev: Option<&Bar>, bar: &Bar) -> f64 {
    let span = bar.high - bar.low;
    let Some(prev) = prev else {
        return span;
    };
    let gap_up = (bar.high - prev.close).abs();
    let gap_down = (bar.low - prev.close).abs();
    if span.is_nan() || gap_up.is_nan() || gap_down.is_nan() {
        return f64::NAN;
    }
    span.max(gap_up).max(gap_down)
}

/// True range for every bar.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| bar_true_range(i.checked_sub(1).map(|p| &bars[p]), bar))
        .collect()
}

/// Wilder average of `values`, seeded with the mean of the first `period`.
///
/// An undefined value in the seed leaves the whole output undefined; one
/// after the seed ends the series there. Skipping it would understate N.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let (seed, rest) = values.split_at(period);
    if seed.iter().any(|v| v.is_nan()) {
        return out;
    }

    let weight = (period - 1) as f64;
    let mut avg = seed.iter().sum::<f64>() / period as f64;
    out[period - 1] = avg;
    for (slot, &tr) in out[period..].iter_mut().zip(rest) {
        if tr.is_nan() {
            break;
        }
        avg = (weight * avg + tr) / period as f64;
        *slot = avg;
    }
    out
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    fn trending() -> Vec<Bar> {
        make_ohlc_bars(&[
            (50.0, 52.0, 49.0, 51.0), // span 3
            (51.0, 54.0, 50.5, 53.5), // max(3.5, 3, 0.5) = 3.5
            (53.5, 53.8, 48.0, 48.5), // max(5.8, 0.3, 5.5) = 5.8
            (52.0, 55.0, 51.0, 54.0), // max(4, 6.5, 2.5) = 6.5
            (54.0, 54.5, 53.0, 53.2), // max(1.5, 0.5, 1) = 1.5
        ])
    }

    #[test]
    fn first_bar_uses_span() {
        let bars = trending();
        assert_approx(bar_true_range(None, &bars[0]), 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn gaps_widen_true_range() {
        let tr = true_range(&trending());
        let expected = [3.0, 3.5, 5.8, 6.5, 1.5];
        for (got, want) in tr.iter().zip(expected) {
            assert_approx(*got, want, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn nan_previous_close_poisons_one_bar() {
        let mut bars = trending();
        bars[1].close = f64::NAN;
        let tr = true_range(&bars);
        assert!(!tr[1].is_nan());
        assert!(tr[2].is_nan());
        assert!(!tr[3].is_nan());
    }

    #[test]
    fn seed_then_wilder() {
        let n = Atr::new(2).compute(&trending());
        assert!(n[0].is_nan());
        // (3 + 3.5) / 2
        assert_approx(n[1], 3.25, DEFAULT_EPSILON);
        // (3.25 + 5.8) / 2
        assert_approx(n[2], 4.525, DEFAULT_EPSILON);
        // (4.525 + 6.5) / 2
        assert_approx(n[3], 5.5125, DEFAULT_EPSILON);
        // (5.5125 + 1.5) / 2
        assert_approx(n[4], 3.50625, DEFAULT_EPSILON);
    }

    #[test]
    fn period_one_is_true_range() {
        let bars = trending();
        let n = Atr::new(1).compute(&bars);
        for (got, want) in n.iter().zip(true_range(&bars)) {
            assert_approx(*got, want, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn too_short_is_undefined() {
        assert!(Atr::new(20).compute(&trending()).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn nan_in_seed_leaves_series_undefined() {
        let mut bars = trending();
        bars[0].low = f64::NAN;
        assert!(Atr::new(3).compute(&bars).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn nan_after_seed_ends_series() {
        let mut bars = trending();
        bars[3].high = f64::NAN;
        let n = Atr::new(2).compute(&bars);
        assert!(!n[2].is_nan());
        assert!(n[3].is_nan());
        assert!(n[4].is_nan());
    }

    #[test]
    fn zero_period_is_undefined() {
        let n = Atr::new(0).compute(&trending());
        assert_eq!(n.len(), 5);
        assert!(n.iter().all(|v| v.is_nan()));
        assert_eq!(Atr::new(0).lookback(), 0);
    }

    #[test]
    fn lookback_and_name() {
        assert_eq!(Atr::new(20).lookback(), 19);
        assert_eq!(Atr::new(20).name(), "atr_20");
    }
}
