//! Position state machine.
//!
//! Consumes the indicator table bar by bar, threads a [`PositionState`]
//! through three ordered stages per bar, and emits at most one [`Signal`]
//! per bar:
//!
//! 1. Entry/exit on channel breakouts (entries gated by the system-1 filter)
//! 2. Pyramiding toward `max_units`
//! 3. Protective stop

pub mod loop_runner;
pub mod signal;
pub mod stages;
pub mod state;

pub use loop_runner::{generate_signals, resume, SignalRun};
pub use signal::{Signal, SignalKind};
pub use stages::{entry_exit_stage, pyramid_stage, step, stop_stage, BarContext};
pub use state::{Direction, InconsistentState, PositionState};
