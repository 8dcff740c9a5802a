//! Boundary checks applied before a series enters the indicator engine.

use super::ingest::DataError;
use crate::config::TurtleConfig;
use crate::domain::Bar;

/// Reject series the engine cannot process.
///
/// - at least `config.min_history()` bars
/// - strictly increasing dates (which also rules out duplicates)
/// - every bar sane: positive prices, `low <= open, close <= high`
pub fn validate_bars(bars: &[Bar], config: &TurtleConfig) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::Empty);
    }
    let required = config.min_history();
    if bars.len() < required {
        return Err(DataError::InsufficientHistory {
            bars: bars.len(),
            required,
        });
    }

    for (index, bar) in bars.iter().enumerate() {
        bar.check().map_err(|source| DataError::InvalidBar {
            index,
            date: bar.date,
            source,
        })?;
        if index > 0 {
            let prev = bars[index - 1].date;
            if bar.date <= prev {
                return Err(DataError::NonMonotonic {
                    index,
                    prev,
                    date: bar.date,
                });
            }
        }
    }

    Ok(())
}
