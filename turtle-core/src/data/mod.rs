//! Data boundary: CSV ingestion and series validation.
//!
//! Fetching from vendors and caching are out of scope; this module only turns
//! a file into a validated `Vec<Bar>`. Failures surface as `DataError` and
//! are never papered over with substitute data.

pub mod ingest;
pub mod validate;

pub use ingest::{load_csv, read_csv, DataError, PriceSeries};
pub use validate::validate_bars;
