//! Standardization pipeline: normalize names, parse and sort the time axis,
//! resample to a fixed cadence, drop incomplete rows.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::observer::{PipelineEvent, PipelineObserver};
use super::resample::{SortedRows, drop_incomplete, resample_mean};
use super::validate::DEFAULT_TIME_AXIS;
use crate::error::SchemaError;
use crate::table::time::timestamp_from_epoch_seconds;
use crate::table::{BucketWidth, Column, ColumnData, Table, TimeIndex, normalize_field_name, parse_timestamp};

/// Default name of the time column looked up when the table has no index.
pub const DEFAULT_TIME_COLUMN: &str = "timestamp";

/// Name given to the output index, matching what the loader installs by
/// default so cleaned files load back with their index intact.
pub const OUTPUT_INDEX_NAME: &str = DEFAULT_TIME_AXIS;

/// Tunables for [`standardize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizeOptions {
    /// Column holding timestamps, used only when the table has no index.
    pub time_column: String,
    /// Resampling cadence.
    pub bucket_width: BucketWidth,
}

impl Default for StandardizeOptions {
    fn default() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            bucket_width: BucketWidth::default(),
        }
    }
}

impl StandardizeOptions {
    pub fn with_bucket_width(mut self, width: BucketWidth) -> Self {
        self.bucket_width = width;
        self
    }
}

/// Produces a cleaned, regularly sampled copy of `table`.
///
/// Output field names are trimmed and lowercase, the index (named
/// [`OUTPUT_INDEX_NAME`]) is strictly ascending on a `bucket_width` grid,
/// and no cell is missing.
/// Unparseable timestamps and unparseable numbers never fail the call;
/// they become missing and the affected rows disappear in the final stage.
///
/// # Errors
///
/// * [`SchemaError::FieldCollision`] if two source fields normalize to the same name.
/// * [`SchemaError::MissingTimeAxis`] if the table has neither an index nor the time column.
///
/// # Examples
///
/// ```
/// use microgrid_eda::clean::observer::NoopObserver;
/// use microgrid_eda::clean::standardize::{StandardizeOptions, standardize};
/// use microgrid_eda::table::{ColumnData, Table};
///
/// let table = Table::new()
///     .with_column("TimeStamp", ColumnData::text([
///         Some("2023-01-01 12:00:00"),
///         Some("2023-01-01 12:30:00"),
///     ]))
///     .and_then(|t| t.with_column("Consumption ", ColumnData::numeric([Some(10.5), Some(11.0)])))
///     .unwrap();
///
/// let cleaned = standardize(table, &StandardizeOptions::default(), &NoopObserver).unwrap();
/// assert_eq!(cleaned.field_names(), vec!["consumption"]);
/// assert_eq!(cleaned.numeric_column("consumption"), Some(&[Some(10.75)][..]));
/// ```
pub fn standardize(
    table: Table,
    options: &StandardizeOptions,
    observer: &dyn PipelineObserver,
) -> Result<Table, SchemaError> {
    let (table, renamed) = normalize_fields(table)?;
    observer.on_event(&PipelineEvent::FieldsNormalized { renamed });

    let (index, fields) = split_time_axis(table, &options.time_column)?;
    let unparseable = index.values.iter().filter(|v| v.is_none()).count();
    observer.on_event(&PipelineEvent::TimestampsParsed {
        parsed: index.len() - unparseable,
        unparseable,
    });

    let rows = sort_by_time(index, fields);
    let input_rows = rows.len();
    let resampled = resample_mean(&rows, options.bucket_width);
    observer.on_event(&PipelineEvent::Resampled {
        input_rows,
        buckets: resampled.span,
    });

    let empty = resampled.empty_buckets();
    let (cleaned, partial) = drop_incomplete(resampled.table);
    observer.on_event(&PipelineEvent::IncompleteRowsDropped {
        dropped: empty.saturating_add(partial),
        remaining: cleaned.len(),
    });
    Ok(cleaned)
}

/// Renames every field (and the index) to its trimmed, lowercase form.
///
/// Returns the renamed table and the `(from, to)` pairs that changed.
///
/// # Errors
///
/// Returns [`SchemaError::FieldCollision`] if distinct source names map to
/// the same normalized name.
pub fn normalize_fields(table: Table) -> Result<(Table, Vec<(String, String)>), SchemaError> {
    let (columns, index) = table.into_parts();

    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let sources = index
        .iter()
        .map(|idx| idx.name.as_str())
        .chain(columns.iter().map(|c| c.name.as_str()));
    for name in sources {
        seen.entry(normalize_field_name(name))
            .or_default()
            .push(name.to_string());
    }
    if let Some((field, sources)) = seen.into_iter().find(|(_, s)| s.len() > 1) {
        return Err(SchemaError::FieldCollision { field, sources });
    }

    let mut renamed = Vec::new();
    let mut rename = |name: String| {
        let normalized = normalize_field_name(&name);
        if normalized != name {
            renamed.push((name, normalized.clone()));
        }
        normalized
    };

    let index = index.map(|idx| TimeIndex::new(rename(idx.name), idx.values));
    let columns = columns
        .into_iter()
        .map(|c| Column::new(rename(c.name), c.data))
        .collect();

    Ok((Table::from_parts_unchecked(columns, index), renamed))
}

/// Separates the time axis from the measurement fields.
///
/// An existing index wins; otherwise the column named `time_column`
/// (normalized) is parsed cell by cell. Measurement fields are coerced to
/// numbers.
fn split_time_axis(
    table: Table,
    time_column: &str,
) -> Result<(TimeIndex, Vec<(String, Vec<Option<f64>>)>), SchemaError> {
    let (mut columns, index) = table.into_parts();

    let index = match index {
        Some(index) => index,
        None => {
            let wanted = normalize_field_name(time_column);
            let pos = columns
                .iter()
                .position(|c| c.name == wanted)
                .ok_or_else(|| SchemaError::MissingTimeAxis {
                    name: time_column.to_string(),
                })?;
            let column = columns.remove(pos);
            TimeIndex::new(column.name, parse_time_column(column.data))
        }
    };

    let fields = columns
        .into_iter()
        .map(|c| (c.name, c.data.into_numeric()))
        .collect();
    Ok((index, fields))
}

/// Converts a column to timestamps; unparseable cells become `None`.
pub fn parse_time_column(data: ColumnData) -> Vec<Option<NaiveDateTime>> {
    match data {
        ColumnData::Text(cells) => cells
            .iter()
            .map(|c| c.as_deref().and_then(parse_timestamp))
            .collect(),
        ColumnData::Numeric(cells) => cells
            .into_iter()
            .map(|c| c.and_then(timestamp_from_epoch_seconds))
            .collect(),
    }
}

/// Stable ascending sort on the time axis. Rows without a timestamp are
/// excluded since they cannot be placed in any bucket.
fn sort_by_time(index: TimeIndex, fields: Vec<(String, Vec<Option<f64>>)>) -> SortedRows {
    let mut order: Vec<(usize, NaiveDateTime)> = index
        .values
        .iter()
        .enumerate()
        .filter_map(|(row, ts)| ts.map(|t| (row, t)))
        .collect();
    order.sort_by_key(|&(_, ts)| ts);

    let fields: Vec<(String, Vec<Option<f64>>)> = fields
        .into_iter()
        .map(|(name, values)| {
            let sorted = order
                .iter()
                .map(|&(row, _)| values.get(row).copied().flatten())
                .collect();
            (name, sorted)
        })
        .collect();

    // Keep the source name if a measurement field already owns the default.
    let index_name = if fields.iter().any(|(name, _)| name == OUTPUT_INDEX_NAME) {
        index.name
    } else {
        OUTPUT_INDEX_NAME.to_string()
    };

    SortedRows {
        index_name,
        timestamps: order.into_iter().map(|(_, ts)| ts).collect(),
        fields,
    }
}
