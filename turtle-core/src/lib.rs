//! Turtle Core: channel-breakout signal engine.
//!
//! This crate contains:
//! - Domain types (daily price bars)
//! - Strategy configuration (TOML, defaults, fingerprint)
//! - Indicator engine: ATR and Donchian breakout channels
//! - Position state machine: entries, pyramiding, exits, protective stops
//! - Volatility unit sizing
//! - Data boundary: CSV ingestion and series validation
//!
//! Data flows one way: bars -> indicator table -> state machine -> signals.

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod sizing;
pub mod system;

pub use config::{ConfigError, Mode, TurtleConfig};
pub use data::DataError;
pub use domain::Bar;
pub use engine::{
    generate_signals, Direction, InconsistentState, PositionState, Signal, SignalKind, SignalRun,
};
pub use indicators::{compute_indicators, IndicatorRow};
pub use system::{SystemRun, TurtleSystem};
