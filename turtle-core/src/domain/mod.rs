//! Domain types shared by the indicator engine and the state machine.

pub mod bar;

pub use bar::{Bar, BarError};
