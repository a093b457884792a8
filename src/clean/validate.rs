//! Fail-fast schema validation.

use std::collections::BTreeSet;

use crate::error::SchemaError;
use crate::table::{Table, normalize_field_name};

/// Measurement fields every microgrid dataset must carry.
pub const REQUIRED_MEASUREMENT_FIELDS: &[&str] = &["consumption", "solar", "wind"];

/// Default name of the time-axis column.
pub const DEFAULT_TIME_AXIS: &str = "index";

/// What a table must contain before standardization accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRules {
    /// Required field names; matched after trimming and lowercasing.
    pub required_fields: Vec<String>,
    /// Name of the expected time-axis column.
    pub time_axis: String,
}

impl Default for SchemaRules {
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

/// Checks that `table` has every required field and a usable time axis.
///
/// Field names on both sides are normalized before comparison. The time
/// axis is satisfied by a column matching `rules.time_axis` or by an
/// existing timestamp index. Does not mutate the table.
///
/// # Errors
///
/// * [`SchemaError::MissingFields`] naming the absent fields, sorted.
/// * [`SchemaError::MissingTimeAxis`] when neither time-axis form exists.
/// * [`SchemaError::InvalidTimeAxis`] when several columns normalize to the
///   time-axis name.
///
/// # Examples
///
/// ```
/// use microgrid_eda::clean::validate::{SchemaRules, validate};
/// use microgrid_eda::error::SchemaError;
/// use microgrid_eda::table::{ColumnData, Table};
///
/// let table = Table::new()
///     .with_column("index", ColumnData::text([Some("2023-01-01 00:00")]))
///     .and_then(|t| t.with_column("Consumption", ColumnData::numeric([Some(1.0)])))
///     .and_then(|t| t.with_column("Solar", ColumnData::numeric([Some(0.0)])))
///     .unwrap();
///
/// let err = validate(&table, &SchemaRules::default()).unwrap_err();
/// assert_eq!(err, SchemaError::MissingFields { fields: vec!["wind".into()] });
/// ```
pub fn validate(table: &Table, rules: &SchemaRules) -> Result<(), SchemaError> {
    let present: BTreeSet<String> = table
        .field_names()
        .into_iter()
        .map(normalize_field_name)
        .collect();

    let missing: BTreeSet<String> = rules
        .required_fields
        .iter()
        .map(|f| normalize_field_name(f))
        .filter(|f| !present.contains(f))
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingFields {
            fields: missing.into_iter().collect(),
        });
    }

    let time_axis = normalize_field_name(&rules.time_axis);
    let matches = table
        .field_names()
        .into_iter()
        .filter(|name| normalize_field_name(name) == time_axis)
        .count();
    match matches {
        0 if table.time_index().is_none() => Err(SchemaError::MissingTimeAxis {
            name: rules.time_axis.clone(),
        }),
        0 | 1 => Ok(()),
        _ => Err(SchemaError::InvalidTimeAxis {
            name: rules.time_axis.clone(),
        }),
    }
}
