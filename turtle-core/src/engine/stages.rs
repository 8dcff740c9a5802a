//! Per-bar decision stages.
//!
//! Every bar runs three stages in a fixed order:
//!
//! 1. Entry/exit: channel breakout entries from flat, channel exits otherwise
//! 2. Pyramiding: add a unit once price runs past the add trigger
//! 3. Protective stop: flatten when the close crosses the trailing stop
//!
//! Each stage returns the next state and an optional label. All state
//! changes apply; when more than one stage labels the same bar, the later
//! stage's label is the one recorded.

use super::signal::SignalKind;
use super::state::{Direction, PositionState};
use crate::config::{Mode, TurtleConfig};
use crate::indicators::IndicatorRow;
use chrono::NaiveDate;

/// Everything a decision on bar i may look at.
///
/// Channel levels come from bar i-1, so a breakout is the close of bar i
/// crossing a level that was fixed before the bar opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarContext {
    pub date: NaiveDate,
    pub prev_close: f64,
    pub close: f64,
    pub atr: f64,
    pub entry_long: f64,
    pub entry_short: f64,
    pub exit_long: f64,
    pub exit_short: f64,
}

impl BarContext {
    /// `None` when the current ATR or any of the previous bar's channels is
    /// undefined: no decision is possible on such a bar.
    pub fn new(prev: &IndicatorRow, current: &IndicatorRow) -> Option<Self> {
        if current.atr.is_nan()
            || current.close.is_nan()
            || prev.close.is_nan()
            || !prev.channels_ready()
        {
            return None;
        }
        Some(Self {
            date: current.date,
            prev_close: prev.close,
            close: current.close,
            atr: current.atr,
            entry_long: prev.entry_long,
            entry_short: prev.entry_short,
            exit_long: prev.exit_long,
            exit_short: prev.exit_short,
        })
    }

    /// Previous close at or below `level`, current close strictly above.
    pub fn crosses_above(&self, level: f64) -> bool {
        self.prev_close <= level && self.close > level
    }

    /// Previous close at or above `level`, current close strictly below.
    pub fn crosses_below(&self, level: f64) -> bool {
        self.prev_close >= level && self.close < level
    }
}

/// Stage 1. Entries require the filter to pass; exits do not.
///
/// In system-1 an entry is only allowed right after a winning trade. System-2
/// has no filter.
pub fn entry_exit_stage(
    state: PositionState,
    ctx: &BarContext,
    config: &TurtleConfig,
) -> (PositionState, Option<SignalKind>) {
    let mode_signal = state.last_trade_won || config.mode != Mode::System1;

    match state.direction {
        Direction::Flat if mode_signal && ctx.crosses_above(ctx.entry_long) => (
            PositionState::open(Direction::Long, ctx.close, ctx.atr, config),
            Some(SignalKind::Long),
        ),
        Direction::Flat if mode_signal && ctx.crosses_below(ctx.entry_short) => (
            PositionState::open(Direction::Short, ctx.close, ctx.atr, config),
            Some(SignalKind::Short),
        ),
        Direction::Long if ctx.crosses_below(ctx.exit_long) => {
            (state.close_out(ctx.close), Some(SignalKind::Exit))
        }
        Direction::Short if ctx.crosses_above(ctx.exit_short) => {
            (state.close_out(ctx.close), Some(SignalKind::Exit))
        }
        _ => (state, None),
    }
}

/// Stage 2. Only while below the unit limit.
pub fn pyramid_stage(
    state: PositionState,
    ctx: &BarContext,
    config: &TurtleConfig,
) -> (PositionState, Option<SignalKind>) {
    if state.units >= config.max_units {
        return (state, None);
    }
    let Some(trigger) = state.add_trigger_price else {
        return (state, None);
    };

    match state.direction {
        Direction::Long if ctx.close > trigger => (
            state.add_unit(ctx.close, ctx.atr, config),
            Some(SignalKind::AddLong),
        ),
        Direction::Short if ctx.close < trigger => (
            state.add_unit(ctx.close, ctx.atr, config),
            Some(SignalKind::AddShort),
        ),
        _ => (state, None),
    }
}

/// Stage 3.
pub fn stop_stage(
    state: PositionState,
    ctx: &BarContext,
    _config: &TurtleConfig,
) -> (PositionState, Option<SignalKind>) {
    let Some(stop) = state.trailing_stop else {
        return (state, None);
    };

    match state.direction {
        Direction::Long if ctx.close < stop => {
            (state.close_out(ctx.close), Some(SignalKind::StopLong))
        }
        Direction::Short if ctx.close > stop => {
            (state.close_out(ctx.close), Some(SignalKind::StopShort))
        }
        _ => (state, None),
    }
}

/// Run all three stages on one bar.
pub fn step(
    state: PositionState,
    ctx: &BarContext,
    config: &TurtleConfig,
) -> (PositionState, Option<SignalKind>) {
    let (state, entry_exit) = entry_exit_stage(state, ctx, config);
    let (state, pyramid) = pyramid_stage(state, ctx, config);
    let (state, stop) = stop_stage(state, ctx, config);
    (state, stop.or(pyramid).or(entry_exit))
}
