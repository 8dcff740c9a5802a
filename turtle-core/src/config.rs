//! Serializable turtle strategy configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Which breakout system drives the channels and the entry filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Short windows, entries gated on the last closed trade.
    #[default]
    #[serde(rename = "system-1", alias = "Mode 1")]
    System1,

    /// Long windows, no entry filter.
    #[serde(rename = "system-2", alias = "Mode 2")]
    System2,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::System1 => "system-1",
            Mode::System2 => "system-2",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system-1" | "system1" | "mode 1" | "1" => Ok(Mode::System1),
            "system-2" | "system2" | "mode 2" | "2" => Ok(Mode::System2),
            other => Err(ConfigError::Invalid(format!(
                "unknown mode '{other}' (expected system-1 or system-2)"
            ))),
        }
    }
}

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters of the turtle system.
///
/// Every field is optional in TOML; missing fields take the classic defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleConfig {
    /// System-1 entry channel length.
    pub entry_length: usize,
    /// System-1 exit channel length.
    pub exit_length: usize,
    pub atr_period: usize,
    /// Fraction of equity risked per unit (0.02 = 2%).
    pub risk_per_trade: f64,
    /// Stop distance from the last fill, in ATRs.
    pub initial_stop_atr_multiple: f64,
    /// Favorable move, in ATRs, that triggers the next unit.
    pub pyramid_atr_multiple: f64,
    pub max_units: u32,
    pub mode: Mode,
    /// System-2 entry channel length.
    pub entry_length_mode2: usize,
    /// System-2 exit channel length.
    pub exit_length_mode2: usize,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            entry_length: 20,
            exit_length: 10,
            atr_period: 14,
            risk_per_trade: 0.02,
            initial_stop_atr_multiple: 2.0,
            pyramid_atr_multiple: 0.5,
            max_units: 4,
            mode: Mode::System1,
            entry_length_mode2: 55,
            exit_length_mode2: 20,
        }
    }
}

impl TurtleConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: TurtleConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("entry_length", self.entry_length),
            ("exit_length", self.exit_length),
            ("atr_period", self.atr_period),
            ("entry_length_mode2", self.entry_length_mode2),
            ("exit_length_mode2", self.exit_length_mode2),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 1")));
            }
        }
        if self.max_units == 0 {
            return Err(ConfigError::Invalid("max_units must be >= 1".into()));
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "risk_per_trade must be in (0, 1), got {}",
                self.risk_per_trade
            )));
        }
        let multiples = [
            ("initial_stop_atr_multiple", self.initial_stop_atr_multiple),
            ("pyramid_atr_multiple", self.pyramid_atr_multiple),
        ];
        for (name, value) in multiples {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Entry channel length for the active mode.
    pub fn entry_window(&self) -> usize {
        match self.mode {
            Mode::System1 => self.entry_length,
            Mode::System2 => self.entry_length_mode2,
        }
    }

    /// Exit channel length for the active mode.
    pub fn exit_window(&self) -> usize {
        match self.mode {
            Mode::System1 => self.exit_length,
            Mode::System2 => self.exit_length_mode2,
        }
    }

    /// Fewest bars a series needs before every indicator can be defined.
    pub fn min_history(&self) -> usize {
        self.atr_period
            .max(self.entry_window())
            .max(self.exit_window())
    }

    /// Deterministic BLAKE3 digest over every parameter.
    ///
    /// Two runs share a fingerprint only if their indicator tables and signal
    /// sequences are guaranteed to be produced by identical parameters.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for len in [
            self.entry_length,
            self.exit_length,
            self.atr_period,
            self.entry_length_mode2,
            self.exit_length_mode2,
        ] {
            hasher.update(&(len as u64).to_le_bytes());
        }
        for x in [
            self.risk_per_trade,
            self.initial_stop_atr_multiple,
            self.pyramid_atr_multiple,
        ] {
            hasher.update(&x.to_bits().to_le_bytes());
        }
        hasher.update(&self.max_units.to_le_bytes());
        hasher.update(self.mode.as_str().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
