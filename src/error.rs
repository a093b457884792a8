//! Error taxonomy: structural schema failures, file boundary failures, and
//! the crate-level error that composes them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Structural validation failure.
///
/// Raised before any transformation proceeds and never recovered
/// internally. Dirty values (bad timestamps, bad numbers) are not schema
/// errors; they degrade to missing values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// One or more required measurement fields are absent. `fields` is sorted.
    #[error("missing required measurement fields: {fields:?}")]
    MissingFields { fields: Vec<String> },

    /// Neither a time-axis column nor a timestamp-typed index is present.
    #[error("time axis column \"{name}\" not found and table has no timestamp index")]
    MissingTimeAxis { name: String },

    /// The time-axis column exists but is named ambiguously after normalization.
    #[error("time axis column \"{name}\" matches more than one source column")]
    InvalidTimeAxis { name: String },

    /// Two distinct source fields map to the same normalized name.
    #[error("fields {sources:?} collide as \"{field}\" after normalization")]
    FieldCollision { field: String, sources: Vec<String> },
}

/// Malformed in-memory table construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("column \"{name}\" has {actual} rows, table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Failure at the load/save boundary.
///
/// Every variant carries the resolved path so callers composing
/// load, validate, standardize and save can report where it happened.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported or malformed data in {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error(
        "table has {cells} missing values; refusing to write {} without allow_missing",
        path.display()
    )]
    MissingValues { path: PathBuf, cells: usize },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Arrow error in {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("Parquet error in {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },
}

impl FileError {
    /// Returns `true` for malformed-content failures, as opposed to a missing
    /// file or an operating-system I/O error.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Format { .. }
                | Self::MissingValues { .. }
                | Self::Csv { .. }
                | Self::Arrow { .. }
                | Self::Parquet { .. }
        )
    }
}

/// Crate-level error for callers running the whole pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("invalid configuration: {}", format_config_errors(.0))]
    Config(Vec<ConfigError>),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(vec![err])
    }
}

fn format_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_sorted_names() {
        let err = SchemaError::MissingFields {
            fields: vec!["solar".to_string(), "wind".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required measurement fields: [\"solar\", \"wind\"]"
        );
    }

    #[test]
    fn not_found_is_not_a_format_error() {
        let err = FileError::NotFound {
            path: PathBuf::from("/tmp/none.csv"),
        };
        assert!(!err.is_format_error());
        assert!(err.to_string().contains("/tmp/none.csv"));
    }

    #[test]
    fn schema_error_converts_into_crate_error() {
        let err: Error = SchemaError::MissingTimeAxis {
            name: "index".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Schema(_)));
    }
}
