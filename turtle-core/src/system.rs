//! One-call entry point: validate, compute indicators, scan for signals.

use crate::config::{ConfigError, TurtleConfig};
use crate::data::{validate_bars, DataError};
use crate::domain::Bar;
use crate::engine::{resume, PositionState, Signal, SignalRun};
use crate::indicators::{compute_indicators, IndicatorRow};
use serde::Serialize;

/// A validated configuration bound to the indicator engine and state machine.
#[derive(Debug, Clone)]
pub struct TurtleSystem {
    config: TurtleConfig,
    fingerprint: String,
}

/// Everything produced by one run over one instrument.
#[derive(Debug, Clone, Serialize)]
pub struct SystemRun {
    /// Fingerprint of the configuration that produced this run.
    pub config_fingerprint: String,
    pub rows: Vec<IndicatorRow>,
    pub run: SignalRun,
}

impl SystemRun {
    pub fn signals(&self) -> &[Signal] {
        &self.run.signals
    }

    /// Signal on the most recent bar, if any.
    pub fn latest_signal(&self) -> Option<&Signal> {
        self.run.latest(&self.rows)
    }

    pub fn final_state(&self) -> PositionState {
        self.run.final_state
    }
}

impl TurtleSystem {
    pub fn new(config: TurtleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fingerprint = config.fingerprint();
        Ok(Self {
            config,
            fingerprint,
        })
    }

    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Indicator table for `bars`. No validation.
    pub fn indicators(&self, bars: &[Bar]) -> Vec<IndicatorRow> {
        compute_indicators(bars, &self.config)
    }

    /// Validate `bars` and run a full scan from a flat state.
    pub fn run(&self, bars: &[Bar], equity: f64) -> Result<SystemRun, DataError> {
        self.run_from(bars, equity, PositionState::default())
    }

    /// Like [`TurtleSystem::run`] but starting from a caller-supplied state,
    /// e.g. one persisted from an earlier session.
    pub fn run_from(
        &self,
        bars: &[Bar],
        equity: f64,
        initial: PositionState,
    ) -> Result<SystemRun, DataError> {
        if let Err(e) = validate_bars(bars, &self.config) {
            tracing::warn!(error = %e, "rejected bar series");
            return Err(e);
        }
        if let Err(e) = initial.check(self.config.max_units) {
            tracing::warn!(error = %e, "rejected starting state");
            return Err(e.into());
        }
        let rows = compute_indicators(bars, &self.config);
        let run = resume(&rows, equity, &self.config, initial)?;
        Ok(SystemRun {
            config_fingerprint: self.fingerprint.clone(),
            rows,
            run,
        })
    }
}
