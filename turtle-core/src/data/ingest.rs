//! CSV ingestion of daily bars.
//!
//! Expected header: `date,open,high,low,close[,volume]` with ISO dates.
//! Title-case headers as written by common vendors (`Date,Open,...`) are
//! accepted; extra columns are ignored.

use crate::domain::{Bar, BarError};
use crate::engine::InconsistentState;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors raised at the data boundary, before anything reaches the engine.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("no bars in series")]
    Empty,

    #[error("need at least {required} bars, got {bars}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("bar {index}: date {date} does not follow {prev}")]
    NonMonotonic {
        index: usize,
        prev: NaiveDate,
        date: NaiveDate,
    },

    #[error("bar {index} ({date}): {source}")]
    InvalidBar {
        index: usize,
        date: NaiveDate,
        #[source]
        source: BarError,
    },

    #[error("cannot resume: {0}")]
    InconsistentState(#[from] InconsistentState),
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    /// Some vendors write volume as a float (`1200.0`).
    #[serde(default, alias = "Volume")]
    volume: Option<f64>,
}

impl From<CsvRecord> for Bar {
    fn from(r: CsvRecord) -> Self {
        Bar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r
                .volume
                .filter(|v| v.is_finite() && *v > 0.0)
                .map_or(0, |v| v.round() as u64),
        }
    }
}

/// Parse bars from any CSV source. Rows are returned in file order.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut bars = Vec::new();
    for record in rdr.deserialize::<CsvRecord>() {
        bars.push(record?.into());
    }
    Ok(bars)
}

/// Parse bars from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let bars = read_csv(std::io::BufReader::new(file))?;
    tracing::debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// A named bar series, one per instrument.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    /// Load a CSV file; the symbol is the file stem (`data/SPY.csv` -> `SPY`).
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let symbol = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            symbol,
            bars: load_csv(path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lowercase_header() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-01-02,10,11,9,10.5,1200\n\
                   2024-01-03,10.5,12,10,11.5,900\n";
        let bars = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].close, 11.5);
        assert_eq!(bars[0].volume, 1200);
    }

    #[test]
    fn reads_vendor_header_without_volume() {
        let csv = "Date,Open,High,Low,Close,Adj Close\n2024-01-02,10,11,9,10.5,10.4\n";
        let bars = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 0);
        assert_eq!(bars[0].high, 11.0);
    }

    #[test]
    fn empty_volume_cell_is_zero() {
        let csv = "date,open,high,low,close,volume\n2024-01-02,10,11,9,10.5,\n";
        let bars = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn float_volume_is_accepted() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-01-02,10,11,9,10.5,1200.0\n\
                   2024-01-03,10.5,12,10,11.5,87.6\n";
        let bars = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 1200);
        assert_eq!(bars[1].volume, 88);
    }

    #[test]
    fn bad_number_is_an_error() {
        let csv = "date,open,high,low,close\n2024-01-02,10,eleven,9,10.5\n";
        assert!(matches!(read_csv(csv.as_bytes()), Err(DataError::Csv(_))));
    }

    #[test]
    fn bad_date_is_an_error() {
        let csv = "date,open,high,low,close\n01/02/2024,10,11,9,10.5\n";
        assert!(matches!(read_csv(csv.as_bytes()), Err(DataError::Csv(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
