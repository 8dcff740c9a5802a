//! Emitted trade actions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of a trade action. At most one per bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Long,
    Short,
    Exit,
    AddLong,
    AddShort,
    StopLong,
    StopShort,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Long => "long",
            SignalKind::Short => "short",
            SignalKind::Exit => "exit",
            SignalKind::AddLong => "add_long",
            SignalKind::AddShort => "add_short",
            SignalKind::StopLong => "stop_long",
            SignalKind::StopShort => "stop_short",
        }
    }

    /// Opens a position from flat.
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalKind::Long | SignalKind::Short)
    }

    pub fn is_add(&self) -> bool {
        matches!(self, SignalKind::AddLong | SignalKind::AddShort)
    }

    /// Closes the whole position (channel exit or protective stop).
    pub fn is_close(&self) -> bool {
        matches!(
            self,
            SignalKind::Exit | SignalKind::StopLong | SignalKind::StopShort
        )
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled decision on one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub kind: SignalKind,
    /// Close of the deciding bar.
    pub price: f64,
    /// Informational unit size at this bar's ATR; not applied by the engine.
    pub unit_size: f64,
    /// Open units after the signal (0 after an exit or stop).
    pub units: u32,
}
