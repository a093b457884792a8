//! In-memory tabular types: named columns plus an optional timestamp index.

use chrono::NaiveDateTime;

use crate::error::TableError;

/// Canonical field identifier: surrounding whitespace trimmed, lowercased.
///
/// # Examples
///
/// ```
/// use microgrid_eda::table::normalize_field_name;
///
/// assert_eq!(normalize_field_name(" Consumption "), "consumption");
/// ```
pub fn normalize_field_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Cell storage for one column. `None` is the missing state.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Floating-point measurements.
    Numeric(Vec<Option<f64>>),
    /// Raw text that has not been coerced to a number.
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Builds a numeric column, storing non-finite values as missing.
    pub fn numeric(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::Numeric(
            values
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        )
    }

    /// Builds a text column.
    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        Self::Text(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing cells.
    pub fn missing(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            Self::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Whether the cell at `row` is missing. Out-of-range rows count as missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Numeric(v) => v.get(row).is_none_or(Option::is_none),
            Self::Text(v) => v.get(row).is_none_or(Option::is_none),
        }
    }

    /// Coerces the column to numbers; text that does not parse becomes missing.
    pub fn into_numeric(self) -> Vec<Option<f64>> {
        match self {
            Self::Numeric(v) => v,
            Self::Text(v) => v
                .into_iter()
                .map(|cell| cell.and_then(|s| parse_number(&s)))
                .collect(),
        }
    }

    /// Reorders rows by `order` (a permutation or subset of row indices).
    pub(crate) fn take(&self, order: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(order.iter().map(|&i| v[i]).collect()),
            Self::Text(v) => Self::Text(order.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// Parses a measurement cell. Empty, non-numeric and non-finite input is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Timestamp ordering key of a table. `None` marks an unparseable timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeIndex {
    pub name: String,
    pub values: Vec<Option<NaiveDateTime>>,
}

impl TimeIndex {
    pub fn new(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered sequence of rows held column-wise.
///
/// Columns keep their insertion order and their source names verbatim;
/// normalization happens only in the standardization pipeline. All columns
/// and the index share the same row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: Option<TimeIndex>,
}

impl Table {
    /// Creates an empty table with no columns and no index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Table::push_column`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::LengthMismatch`] if the column length differs
    /// from the table's row count.
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Result<Self, TableError> {
        self.push_column(Column::new(name, data))?;
        Ok(self)
    }

    /// Builder-style [`Table::set_index`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::LengthMismatch`] if the index length differs
    /// from the table's row count.
    pub fn with_index(mut self, index: TimeIndex) -> Result<Self, TableError> {
        self.set_index(index)?;
        Ok(self)
    }

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::LengthMismatch`] if the column length differs
    /// from the table's row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if let Some(expected) = self.row_count() {
            let actual = column.data.len();
            if actual != expected {
                return Err(TableError::LengthMismatch {
                    name: column.name,
                    expected,
                    actual,
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Installs (or replaces) the timestamp index.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::LengthMismatch`] if the index length differs
    /// from the columns' row count.
    pub fn set_index(&mut self, index: TimeIndex) -> Result<(), TableError> {
        if let Some(expected) = self.columns.first().map(|c| c.data.len()) {
            let actual = index.len();
            if actual != expected {
                return Err(TableError::LengthMismatch {
                    name: index.name,
                    expected,
                    actual,
                });
            }
        }
        self.index = Some(index);
        Ok(())
    }

    fn row_count(&self) -> Option<usize> {
        self.index
            .as_ref()
            .map(TimeIndex::len)
            .or_else(|| self.columns.first().map(|c| c.data.len()))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.row_count().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Field names in column order, excluding the index.
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a numeric column by exact name.
    pub fn numeric_column(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(values)) => Some(values),
            _ => None,
        }
    }

    /// The timestamp index, if the table has one.
    pub fn time_index(&self) -> Option<&TimeIndex> {
        self.index.as_ref()
    }

    /// Total number of missing cells across the index and all columns.
    pub fn missing_cells(&self) -> usize {
        let index_missing = self
            .index
            .as_ref()
            .map_or(0, |idx| idx.values.iter().filter(|v| v.is_none()).count());
        index_missing + self.columns.iter().map(|c| c.data.missing()).sum::<usize>()
    }

    pub fn has_missing(&self) -> bool {
        self.missing_cells() > 0
    }

    /// Splits the table into its parts.
    pub fn into_parts(self) -> (Vec<Column>, Option<TimeIndex>) {
        (self.columns, self.index)
    }

    /// Reassembles a table from parts, re-checking row counts.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::LengthMismatch`] if any part disagrees on row count.
    pub fn from_parts(columns: Vec<Column>, index: Option<TimeIndex>) -> Result<Self, TableError> {
        let mut table = Self::new();
        if let Some(index) = index {
            table.set_index(index)?;
        }
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Assembles parts whose row counts are already known to agree.
    pub(crate) fn from_parts_unchecked(columns: Vec<Column>, index: Option<TimeIndex>) -> Self {
        debug_assert!(Self::from_parts(columns.clone(), index.clone()).is_ok());
        Self { columns, index }
    }
}
