//! Volatility-based unit sizing.
//!
//! Classic turtle risk management: risk a fixed fraction of equity per unit,
//! with the protective stop a fixed number of ATRs away.
//!
//! # Formula
//! ```text
//! risk_dollars  = equity * risk_per_trade
//! stop_distance = initial_stop_atr_multiple * ATR
//! unit_size     = risk_dollars / stop_distance
//! ```
//!
//! # Example
//! - Equity: $10,000
//! - Risk per trade: 2% ($200)
//! - ATR: $4.00, stop at 2x ATR = $8.00
//! - Unit: $200 / $8.00 = 25 shares
//!
//! The state machine reports this figure alongside each signal but never uses
//! it to decide anything; order quantities are the caller's concern.

use crate::config::TurtleConfig;

/// Size of one unit. Zero when ATR is undefined or not positive, or when
/// equity is not positive.
pub fn unit_size(
    equity: f64,
    risk_per_trade: f64,
    initial_stop_atr_multiple: f64,
    atr: f64,
) -> f64 {
    if !atr.is_finite() || atr <= 0.0 || equity.is_nan() || equity <= 0.0 {
        return 0.0;
    }
    let stop_distance = initial_stop_atr_multiple * atr;
    if stop_distance.is_nan() || stop_distance <= 0.0 {
        return 0.0;
    }
    equity * risk_per_trade / stop_distance
}

/// [`unit_size`] with the risk parameters taken from a config.
pub fn unit_size_for(config: &TurtleConfig, equity: f64, atr: f64) -> f64 {
    unit_size(
        equity,
        config.risk_per_trade,
        config.initial_stop_atr_multiple,
        atr,
    )
}
