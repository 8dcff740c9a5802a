//! Bar-by-bar scan over the indicator table.
//!
//! The scan is a fold: the position state produced by bar i is the input to
//! bar i+1. Bars must arrive in ascending date order and are processed one
//! at a time; nothing here may be reordered or parallelized.

use super::signal::Signal;
use super::stages::{step, BarContext};
use super::state::{InconsistentState, PositionState};
use crate::config::TurtleConfig;
use crate::indicators::IndicatorRow;
use crate::sizing::unit_size_for;
use serde::{Deserialize, Serialize};

/// Output of one scan over an indicator table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRun {
    pub signals: Vec<Signal>,
    /// Position state after each row, aligned with the input rows. The first
    /// entry is the initial state (row 0 only seeds the previous values).
    pub states: Vec<PositionState>,
    pub final_state: PositionState,
}

impl SignalRun {
    /// Signal emitted on the last row, if any.
    pub fn latest(&self, rows: &[IndicatorRow]) -> Option<&Signal> {
        let last = rows.last()?;
        self.signals.last().filter(|s| s.date == last.date)
    }
}

/// Generate signals from a fresh flat state.
pub fn generate_signals(
    rows: &[IndicatorRow],
    equity: f64,
    config: &TurtleConfig,
) -> Vec<Signal> {
    scan(rows, equity, config, PositionState::default()).signals
}

/// Continue a scan from a known state.
///
/// `rows[0]` must be the last bar the previous scan already processed: it
/// only supplies the previous close and channel levels and is never decided
/// on again. Passing the `final_state` of one call together with the
/// overlapping row makes consecutive calls equivalent to one long scan.
///
/// `initial` usually comes from outside (a persisted session), so it is
/// checked against `config.max_units` before any bar is decided.
pub fn resume(
    rows: &[IndicatorRow],
    equity: f64,
    config: &TurtleConfig,
    initial: PositionState,
) -> Result<SignalRun, InconsistentState> {
    initial.check(config.max_units)?;
    Ok(scan(rows, equity, config, initial))
}

fn scan(
    rows: &[IndicatorRow],
    equity: f64,
    config: &TurtleConfig,
    initial: PositionState,
) -> SignalRun {
    let mut signals = Vec::new();
    let mut states = Vec::with_capacity(rows.len());
    if !rows.is_empty() {
        states.push(initial);
    }

    let final_state = rows.windows(2).fold(initial, |state, pair| {
        let (next, label) = match BarContext::new(&pair[0], &pair[1]) {
            Some(ctx) => step(state, &ctx, config),
            None => (state, None),
        };

        if let Some(kind) = label {
            let current = &pair[1];
            let signal = Signal {
                date: current.date,
                kind,
                price: current.close,
                unit_size: unit_size_for(config, equity, current.atr),
                units: next.units,
            };
            tracing::debug!(
                date = %signal.date,
                kind = %signal.kind,
                price = signal.price,
                units = signal.units,
                "signal"
            );
            signals.push(signal);
        }

        states.push(next);
        next
    });

    tracing::info!(
        bars = rows.len(),
        signals = signals.len(),
        mode = %config.mode,
        direction = ?final_state.direction,
        units = final_state.units,
        "signal scan complete"
    );

    SignalRun {
        signals,
        states,
        final_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::engine::{Direction, SignalKind};
    use chrono::NaiveDate;

    fn rows(closes: &[f64], channel_high: f64, channel_low: f64) -> Vec<IndicatorRow> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| IndicatorRow {
                date: base + chrono::Duration::days(i as i64),
                close,
                atr: 2.0,
                entry_long: channel_high,
                entry_short: channel_low,
                exit_long: channel_low,
                exit_short: channel_high,
            })
            .collect()
    }

    fn system2() -> TurtleConfig {
        TurtleConfig::default().with_mode(Mode::System2)
    }

    #[test]
    fn empty_and_single_row() {
        let config = system2();
        let run = resume(&[], 10_000.0, &config, PositionState::default()).unwrap();
        assert!(run.signals.is_empty());
        assert!(run.states.is_empty());

        let one = rows(&[100.0], 105.0, 95.0);
        let run = resume(&one, 10_000.0, &config, PositionState::default()).unwrap();
        assert!(run.signals.is_empty());
        assert_eq!(run.states.len(), 1);
    }

    #[test]
    fn breakout_emits_long_with_unit_size() {
        let table = rows(&[100.0, 104.0, 106.0], 105.0, 95.0);
        let signals = generate_signals(&table, 10_000.0, &system2());
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.kind, SignalKind::Long);
        assert_eq!(s.date, table[2].date);
        assert_eq!(s.price, 106.0);
        assert_eq!(s.units, 1);
        // 10_000 * 0.02 / (2 * 2)
        assert_eq!(s.unit_size, 50.0);
    }

    #[test]
    fn states_align_with_rows() {
        let table = rows(&[100.0, 104.0, 106.0, 107.5], 105.0, 95.0);
        let run = resume(&table, 10_000.0, &system2(), PositionState::default()).unwrap();
        assert_eq!(run.states.len(), table.len());
        assert!(run.states[1].is_flat());
        assert_eq!(run.states[2].direction, Direction::Long);
        // 107.5 > 106 + 0.5 * 2
        assert_eq!(run.states[3].units, 2);
        assert_eq!(run.final_state, run.states[3]);
    }

    #[test]
    fn undefined_rows_leave_state_untouched() {
        let mut table = rows(&[100.0, 104.0, 106.0], 105.0, 95.0);
        table[2].atr = f64::NAN;
        let run = resume(&table, 10_000.0, &system2(), PositionState::default()).unwrap();
        assert!(run.signals.is_empty());
        assert_eq!(run.final_state, PositionState::default());
    }

    #[test]
    fn resume_matches_single_scan() {
        let table = rows(&[100.0, 104.0, 106.0, 107.5, 109.0, 94.0, 93.0, 106.0], 105.0, 95.0);
        let config = system2();
        let full = resume(&table, 10_000.0, &config, PositionState::default()).unwrap();

        let first = resume(&table[..4], 10_000.0, &config, PositionState::default()).unwrap();
        let second = resume(&table[3..], 10_000.0, &config, first.final_state).unwrap();

        let mut stitched = first.signals.clone();
        stitched.extend(second.signals.iter().cloned());
        assert_eq!(stitched, full.signals);
        assert_eq!(second.final_state, full.final_state);
    }

    #[test]
    fn latest_only_reports_last_bar() {
        let table = rows(&[100.0, 104.0, 106.0], 105.0, 95.0);
        let config = system2();
        let run = resume(&table, 10_000.0, &config, PositionState::default()).unwrap();
        assert_eq!(run.latest(&table).map(|s| s.kind), Some(SignalKind::Long));

        let longer = rows(&[100.0, 104.0, 106.0, 106.2], 105.0, 95.0);
        let run = resume(&longer, 10_000.0, &config, PositionState::default()).unwrap();
        assert!(run.latest(&longer).is_none());
    }

    #[test]
    fn resume_rejects_state_beyond_unit_cap() {
        let defaults = TurtleConfig::default();
        let saved = PositionState::open(Direction::Long, 100.0, 2.0, &defaults)
            .add_unit(101.0, 2.0, &defaults)
            .add_unit(102.0, 2.0, &defaults);
        let tighter = TurtleConfig {
            max_units: 2,
            ..system2()
        };
        let table = rows(&[100.0, 104.0, 106.0], 105.0, 95.0);

        let err = resume(&table, 10_000.0, &tighter, saved).unwrap_err();
        assert_eq!(err.units, 3);
        assert_eq!(err.max_units, 2);
        assert!(resume(&table, 10_000.0, &defaults, saved).is_ok());
    }

    #[test]
    fn resume_rejects_half_open_state() {
        let mut saved = PositionState::flat(true);
        saved.trailing_stop = Some(90.0);
        let table = rows(&[100.0, 104.0], 105.0, 95.0);
        assert!(resume(&table, 10_000.0, &system2(), saved).is_err());
    }
}
