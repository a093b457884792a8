//! TOML-based pipeline configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::clean::standardize::{DEFAULT_TIME_COLUMN, StandardizeOptions};
use crate::clean::validate::{DEFAULT_TIME_AXIS, REQUIRED_MEASUREMENT_FIELDS, SchemaRules};
use crate::io::{LoadOptions, SaveFormat, SaveOptions};
use crate::table::BucketWidth;

/// Top-level pipeline configuration parsed from TOML.
///
/// All fields have defaults matching the hourly preset. Load from TOML
/// with [`PipelineConfig::from_toml_file`] or use [`PipelineConfig::hourly`]
/// for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Required fields and time-axis name checked before cleaning.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// How the raw file is read.
    #[serde(default)]
    pub input: InputConfig,
    /// Time column and resampling cadence.
    #[serde(default)]
    pub standardize: StandardizeConfig,
    /// How the cleaned table is written.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Schema validation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Measurement fields that must be present (case-insensitive).
    pub required_fields: Vec<String>,
    /// Name of the expected time-axis column.
    pub time_axis: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            required_fields: REQUIRED_MEASUREMENT_FIELDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            time_axis: DEFAULT_TIME_AXIS.to_string(),
        }
    }
}

/// Loader parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Column parsed into the timestamp index; empty disables it.
    pub time_column: String,
    /// Parse the time column as timestamps.
    pub parse_dates: bool,
    /// Optional subset of columns to read.
    pub usecols: Option<Vec<String>>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            time_column: DEFAULT_TIME_AXIS.to_string(),
            parse_dates: true,
            usecols: None,
        }
    }
}

/// Standardization parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StandardizeConfig {
    /// Time column used when the table has no index.
    pub time_column: String,
    /// Bucket rule such as `"1h"` or `"15min"`.
    pub bucket: String,
}

impl Default for StandardizeConfig {
    fn default() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            bucket: "1h".to_string(),
        }
    }
}

/// Writer parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// `"csv"` or `"parquet"` (alias `"pq"`).
    pub format: SaveFormat,
    /// Allow writing tables that still contain missing values.
    pub allow_missing: bool,
    /// Write the timestamp index as a column.
    pub write_index: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: SaveFormat::Csv,
            allow_missing: false,
            write_index: true,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"standardize.bucket"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl PipelineConfig {
    /// Returns the hourly preset (one-hour buckets, CSV output).
    pub fn hourly() -> Self {
        Self::default()
    }

    /// Returns the quarter-hourly preset: 15-minute buckets, Parquet output.
    pub fn quarter_hourly() -> Self {
        Self {
            standardize: StandardizeConfig {
                bucket: "15min".to_string(),
                ..StandardizeConfig::default()
            },
            output: OutputConfig {
                format: SaveFormat::Parquet,
                ..OutputConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the daily preset: one-day buckets.
    pub fn daily() -> Self {
        Self {
            standardize: StandardizeConfig {
                bucket: "1d".to_string(),
                ..StandardizeConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["hourly", "quarter_hourly", "daily"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "hourly" => Ok(Self::hourly()),
            "quarter_hourly" => Ok(Self::quarter_hourly()),
            "daily" => Ok(Self::daily()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.schema;
        if s.required_fields.iter().any(|f| f.trim().is_empty()) {
            errors.push(ConfigError {
                field: "schema.required_fields".into(),
                message: "must not contain empty names".into(),
            });
        }
        if s.time_axis.trim().is_empty() {
            errors.push(ConfigError {
                field: "schema.time_axis".into(),
                message: "must not be empty".into(),
            });
        }

        if self.standardize.time_column.trim().is_empty() {
            errors.push(ConfigError {
                field: "standardize.time_column".into(),
                message: "must not be empty".into(),
            });
        }
        if let Err(e) = self.standardize.bucket.parse::<BucketWidth>() {
            errors.push(ConfigError {
                field: "standardize.bucket".into(),
                message: e.to_string(),
            });
        }

        errors
    }

    /// Schema rules for [`crate::clean::validate::validate`].
    pub fn schema_rules(&self) -> SchemaRules {
        SchemaRules {
            required_fields: self.schema.required_fields.clone(),
            time_axis: self.schema.time_axis.clone(),
        }
    }

    /// Options for [`crate::io::load`].
    pub fn load_options(&self) -> LoadOptions {
        let time_column = self.input.time_column.trim();
        LoadOptions {
            time_column: (!time_column.is_empty()).then(|| time_column.to_string()),
            parse_dates: self.input.parse_dates,
            usecols: self.input.usecols.clone(),
        }
    }

    /// Options for [`crate::clean::standardize::standardize`].
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bucket rule does not parse.
    pub fn standardize_options(&self) -> Result<StandardizeOptions, ConfigError> {
        let bucket_width = self
            .standardize
            .bucket
            .parse::<BucketWidth>()
            .map_err(|e| ConfigError {
                field: "standardize.bucket".into(),
                message: e.to_string(),
            })?;
        Ok(StandardizeOptions {
            time_column: self.standardize.time_column.clone(),
            bucket_width,
        })
    }

    /// Options for [`crate::io::save`].
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            format: self.output.format,
            allow_missing: self.output.allow_missing,
            write_index: self.output.write_index,
        }
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "required={:?} time_axis={} bucket={} output={}",
            self.schema.required_fields,
            self.schema.time_axis,
            self.standardize.bucket,
            self.output.format,
        )
    }
}
