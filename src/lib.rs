//! Cleaning and standardization of microgrid energy measurements.
//!
//! Raw tables of consumption, solar and wind readings are validated,
//! given canonical field names, resampled to a fixed cadence by
//! averaging, and stripped of incomplete periods.

/// Schema validation and the standardization pipeline.
pub mod clean;
pub mod config;
pub mod error;
/// CSV and Parquet load/save boundary.
pub mod io;
pub mod report;
pub mod runner;
/// Typed table, timestamps, and bucket widths.
pub mod table;

pub use error::{Error, FileError, SchemaError};
