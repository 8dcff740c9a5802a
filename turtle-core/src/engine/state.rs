//! Position state threaded through the bar-by-bar scan.

use crate::config::TurtleConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side of the open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Flat,
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Flat => 0.0,
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// The single piece of mutable process state of one strategy run.
///
/// A plain `Copy` value: each bar consumes the previous state and yields the
/// next one, so nothing is shared between instruments or runs.
///
/// Invariant: `direction == Flat` iff `units == 0` iff `avg_price`,
/// `trailing_stop` and `add_trigger_price` are all `None`, except that
/// `add_trigger_price` is also `None` once `units == max_units`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub direction: Direction,
    pub units: u32,
    /// Average entry price over all open units, each unit weighted equally.
    pub avg_price: Option<f64>,
    pub trailing_stop: Option<f64>,
    /// Close beyond which the next unit is added.
    pub add_trigger_price: Option<f64>,
    /// Outcome of the most recently closed trade.
    pub last_trade_won: bool,
}

/// A starting state that breaks the flat/open invariant for a given unit cap.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("inconsistent position state: {direction:?} with {units} unit(s), max_units {max_units}")]
pub struct InconsistentState {
    pub direction: Direction,
    pub units: u32,
    pub max_units: u32,
}

impl Default for PositionState {
    fn default() -> Self {
        Self::flat(false)
    }
}

impl PositionState {
    pub fn flat(last_trade_won: bool) -> Self {
        Self {
            direction: Direction::Flat,
            units: 0,
            avg_price: None,
            trailing_stop: None,
            add_trigger_price: None,
            last_trade_won,
        }
    }

    /// A fresh one-unit position filled at `price`.
    ///
    /// Taking an entry clears `last_trade_won` until the trade is closed.
    pub fn open(direction: Direction, price: f64, atr: f64, config: &TurtleConfig) -> Self {
        debug_assert!(direction != Direction::Flat);
        let sign = direction.sign();
        Self {
            direction,
            units: 1,
            avg_price: Some(price),
            trailing_stop: Some(price - sign * config.initial_stop_atr_multiple * atr),
            add_trigger_price: (config.max_units > 1)
                .then(|| price + sign * config.pyramid_atr_multiple * atr),
            last_trade_won: false,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    /// Add one unit filled at `price`; stop and next trigger move to the new fill.
    pub fn add_unit(self, price: f64, atr: f64, config: &TurtleConfig) -> Self {
        let Some(avg) = self.avg_price else {
            return self;
        };
        let sign = self.direction.sign();
        let units = self.units + 1;
        Self {
            units,
            avg_price: Some((avg * f64::from(self.units) + price) / f64::from(units)),
            trailing_stop: Some(price - sign * config.initial_stop_atr_multiple * atr),
            add_trigger_price: (units < config.max_units)
                .then(|| price + sign * config.pyramid_atr_multiple * atr),
            ..self
        }
    }

    /// Close the whole position at `price`, recording whether it won.
    ///
    /// There is no partial close: every unit goes at once.
    pub fn close_out(self, price: f64) -> Self {
        let won = self
            .avg_price
            .is_some_and(|avg| self.direction.sign() * (price - avg) > 0.0);
        Self::flat(won)
    }

    /// [`PositionState::is_consistent`] as a `Result`, for states that come
    /// from outside the scan (e.g. deserialized from a previous session).
    pub fn check(&self, max_units: u32) -> Result<(), InconsistentState> {
        if self.is_consistent(max_units) {
            Ok(())
        } else {
            Err(InconsistentState {
                direction: self.direction,
                units: self.units,
                max_units,
            })
        }
    }

    /// Check the flat/open invariant and the unit bound.
    pub fn is_consistent(&self, max_units: u32) -> bool {
        match self.direction {
            Direction::Flat => {
                self.units == 0
                    && self.avg_price.is_none()
                    && self.trailing_stop.is_none()
                    && self.add_trigger_price.is_none()
            }
            Direction::Long | Direction::Short => {
                (1..=max_units).contains(&self.units)
                    && self.avg_price.is_some()
                    && self.trailing_stop.is_some()
                    && (self.add_trigger_price.is_some() == (self.units < max_units))
            }
        }
    }
}
