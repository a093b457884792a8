//! File boundary: load a table from CSV or Parquet, save one back.
//!
//! Loading keeps field names verbatim and parses nothing specially except
//! the designated time column. Saving refuses tables with missing values
//! unless told otherwise.

pub mod columnar;
pub mod delimited;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::clean::standardize::parse_time_column;
use crate::error::FileError;
use crate::table::{Column, ColumnData, Table, TimeIndex, format_timestamp};

/// On-disk table format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Csv,
    #[serde(alias = "pq")]
    Parquet,
}

impl SaveFormat {
    /// Picks a format from a file extension; anything unrecognized is CSV.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or(Self::Csv)
    }
}

impl FromStr for SaveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(format!("unsupported format \"{other}\", expected csv or parquet")),
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Parquet => write!(f, "parquet"),
        }
    }
}

/// How [`load`] reads a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Column to parse as timestamps and install as the table index.
    pub time_column: Option<String>,
    /// When `false`, a text time column is left as an ordinary column.
    pub parse_dates: bool,
    /// Restricts loading to these columns (exact source names).
    pub usecols: Option<Vec<String>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            time_column: Some("index".to_string()),
            parse_dates: true,
            usecols: None,
        }
    }
}

/// How [`save`] writes a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub format: SaveFormat,
    /// Permit writing tables that still contain missing values.
    pub allow_missing: bool,
    /// Write the time index as the first column.
    pub write_index: bool,
}

impl SaveOptions {
    pub fn new(format: SaveFormat) -> Self {
        Self {
            format,
            allow_missing: false,
            write_index: true,
        }
    }
}

/// Column as read from disk, before the time column is singled out.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub data: RawData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    Cells(ColumnData),
    /// Natively timestamp-typed storage (Parquet only).
    Timestamps(Vec<Option<NaiveDateTime>>),
}

impl RawData {
    fn len(&self) -> usize {
        match self {
            Self::Cells(data) => data.len(),
            Self::Timestamps(values) => values.len(),
        }
    }
}

/// Expands a leading `~` and makes the path absolute.
///
/// # Errors
///
/// Returns [`FileError::Io`] if the current directory cannot be determined.
pub fn resolve_path(path: &Path) -> Result<PathBuf, FileError> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    std::path::absolute(&expanded).map_err(|source| FileError::Io {
        path: expanded,
        source,
    })
}

/// Reads a CSV or Parquet file into a [`Table`].
///
/// # Errors
///
/// * [`FileError::NotFound`] if the file does not exist.
/// * [`FileError::Format`] for unknown `usecols` names or ragged data.
/// * [`FileError::Csv`], [`FileError::Parquet`], [`FileError::Arrow`] for
///   unreadable content.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Table, FileError> {
    let path = resolve_path(path.as_ref())?;
    if !path.is_file() {
        return Err(FileError::NotFound { path });
    }

    let format = SaveFormat::from_path(&path);
    tracing::info!(path = %path.display(), %format, "loading data");

    let raw = match format {
        SaveFormat::Csv => delimited::read_path(&path)?,
        SaveFormat::Parquet => columnar::read_path(&path)?,
    };
    let table = assemble(raw, options, &path)?;

    tracing::info!(
        rows = table.len(),
        columns = ?table.field_names(),
        "loaded data"
    );
    Ok(table)
}

/// Writes `table` to `path`, creating parent directories.
///
/// # Errors
///
/// * [`FileError::MissingValues`] if the table has missing cells and
///   `allow_missing` is off.
/// * [`FileError::Io`], [`FileError::Csv`], [`FileError::Parquet`],
///   [`FileError::Arrow`] when writing fails.
pub fn save(table: &Table, path: impl AsRef<Path>, options: &SaveOptions) -> Result<(), FileError> {
    let path = resolve_path(path.as_ref())?;

    let cells = table.missing_cells();
    if cells > 0 && !options.allow_missing {
        return Err(FileError::MissingValues { path, cells });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FileError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    tracing::info!(path = %path.display(), format = %options.format, "saving processed data");
    match options.format {
        SaveFormat::Csv => delimited::write_path(table, &path, options.write_index)?,
        SaveFormat::Parquet => columnar::write_path(table, &path, options.write_index)?,
    }
    tracing::info!(rows = table.len(), path = %path.display(), "saved processed data");
    Ok(())
}

/// Applies `usecols` and the time column to freshly read columns.
fn assemble(raw: Vec<RawColumn>, options: &LoadOptions, path: &Path) -> Result<Table, FileError> {
    let mut raw = raw;

    if let Some(usecols) = &options.usecols {
        if let Some(unknown) = usecols.iter().find(|u| !raw.iter().any(|c| &c.name == *u)) {
            return Err(FileError::Format {
                path: path.to_path_buf(),
                message: format!("usecols names unknown column \"{unknown}\""),
            });
        }
        raw.retain(|c| usecols.contains(&c.name));
    }

    let mut index = None;
    if let Some(time_column) = &options.time_column {
        match raw.iter().position(|c| &c.name == time_column) {
            Some(pos) => {
                let candidate = &raw[pos];
                let typed = matches!(candidate.data, RawData::Timestamps(_));
                if typed || options.parse_dates {
                    let column = raw.remove(pos);
                    let values = match column.data {
                        RawData::Timestamps(values) => values,
                        RawData::Cells(data) => parse_time_column(data),
                    };
                    index = Some(TimeIndex::new(column.name, values));
                }
            }
            None => tracing::warn!(
                time_column = %time_column,
                "time column not found; table has no timestamp index"
            ),
        }
    }

    let mut table = Table::new();
    if let Some(index) = index {
        table.set_index(index).map_err(|e| format_error(path, e))?;
    }
    for column in raw {
        let rows = column.data.len();
        let data = match column.data {
            RawData::Cells(data) => data,
            RawData::Timestamps(values) => ColumnData::Text(
                values
                    .iter()
                    .map(|v| v.as_ref().map(format_timestamp))
                    .collect(),
            ),
        };
        debug_assert_eq!(data.len(), rows);
        table
            .push_column(Column::new(column.name, data))
            .map_err(|e| format_error(path, e))?;
    }
    Ok(table)
}

fn format_error(path: &Path, err: impl fmt::Display) -> FileError {
    FileError::Format {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
