//! Fixed-width bucket aggregation over time-sorted rows.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::table::time::from_epoch_micros;
use crate::table::{BucketWidth, Column, ColumnData, Table, TimeIndex};

/// Time-sorted rows with every timestamp present and every field numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedRows {
    /// Name given to the output time index.
    pub index_name: String,
    /// Ascending timestamps, one per row.
    pub timestamps: Vec<NaiveDateTime>,
    /// Measurement fields, each with one cell per row.
    pub fields: Vec<(String, Vec<Option<f64>>)>,
}

impl SortedRows {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BucketStats {
    count: usize,
    sum: f64,
}

impl BucketStats {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Output of [`resample_mean`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// One row per bucket that at least one input row falls into.
    pub table: Table,
    /// Number of buckets on the grid from the first to the last occupied
    /// bucket, counting the empty ones in between.
    pub span: usize,
}

impl Resampled {
    /// Buckets on the grid that no row fell into. Each of them would hold
    /// nothing but missing values.
    pub fn empty_buckets(&self) -> usize {
        self.span.saturating_sub(self.table.len())
    }
}

/// Aggregates rows into left-closed, epoch-aligned buckets of `width`.
///
/// Each output cell is the mean of the present values falling in that
/// bucket, or missing when there are none. Only occupied buckets are
/// materialized; empty ones on the grid are counted in
/// [`Resampled::span`] so a stray far-off timestamp costs one row, not a
/// bucket for every step in between.
///
/// `rows.timestamps` must be ascending.
pub fn resample_mean(rows: &SortedRows, width: BucketWidth) -> Resampled {
    let n_fields = rows.fields.len();
    let mut buckets: BTreeMap<i64, Vec<BucketStats>> = BTreeMap::new();

    for (row, ts) in rows.timestamps.iter().enumerate() {
        let stats = buckets
            .entry(width.floor(ts))
            .or_insert_with(|| vec![BucketStats::default(); n_fields]);
        for (cell, (_, values)) in stats.iter_mut().zip(&rows.fields) {
            if let Some(Some(v)) = values.get(row) {
                cell.count += 1;
                cell.sum += v;
            }
        }
    }

    let span = match (buckets.keys().next(), buckets.keys().next_back()) {
        (Some(&first), Some(&last)) => {
            let steps = (i128::from(last) - i128::from(first)) / i128::from(width.as_micros());
            usize::try_from(steps + 1).unwrap_or(usize::MAX)
        }
        _ => 0,
    };

    let index_values = buckets.keys().map(|&start| from_epoch_micros(start)).collect();
    let columns = rows
        .fields
        .iter()
        .enumerate()
        .map(|(f, (name, _))| {
            let means = buckets.values().map(|stats| stats[f].mean());
            Column::new(name.clone(), ColumnData::Numeric(means.collect()))
        })
        .collect();

    Resampled {
        table: Table::from_parts_unchecked(
            columns,
            Some(TimeIndex::new(rows.index_name.clone(), index_values)),
        ),
        span,
    }
}

/// Removes every row with a missing timestamp or a missing field value.
///
/// Returns the filtered table and the number of rows removed.
pub fn drop_incomplete(table: Table) -> (Table, usize) {
    let rows = table.len();
    let keep: Vec<usize> = (0..rows)
        .filter(|&row| {
            let index_ok = table
                .time_index()
                .is_none_or(|idx| matches!(idx.values.get(row), Some(Some(_))));
            index_ok && table.columns().iter().all(|c| !c.data.is_missing(row))
        })
        .collect();

    let dropped = rows - keep.len();
    if dropped == 0 {
        return (table, 0);
    }

    let (columns, index) = table.into_parts();
    let columns = columns
        .into_iter()
        .map(|c| Column::new(c.name, c.data.take(&keep)))
        .collect();
    let index = index.map(|idx| TimeIndex {
        values: keep.iter().map(|&i| idx.values[i]).collect(),
        name: idx.name,
    });
    (Table::from_parts_unchecked(columns, index), dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn rows(stamps: &[&str], values: &[Option<f64>]) -> SortedRows {
        SortedRows {
            index_name: "timestamp".to_string(),
            timestamps: stamps.iter().map(|s| ts(s)).collect(),
            fields: vec![("consumption".to_string(), values.to_vec())],
        }
    }

    #[test]
    fn half_hourly_rows_average_into_hours() {
        let input = rows(
            &["2023-01-01 12:00", "2023-01-01 12:30", "2023-01-01 13:00", "2023-01-01 13:30"],
            &[Some(10.5), Some(11.0), Some(12.5), Some(13.0)],
        );
        let out = resample_mean(&input, BucketWidth::hours(1));
        assert_eq!(out.span, 2);
        assert_eq!(
            out.table.time_index().unwrap().values,
            vec![Some(ts("2023-01-01 12:00")), Some(ts("2023-01-01 13:00"))]
        );
        assert_eq!(
            out.table.numeric_column("consumption").unwrap(),
            &[Some(10.75), Some(12.75)]
        );
    }

    #[test]
    fn mean_skips_missing_values() {
        let input = rows(
            &["2023-01-01 12:00", "2023-01-01 12:20", "2023-01-01 12:40"],
            &[Some(5.0), None, Some(6.0)],
        );
        let out = resample_mean(&input, BucketWidth::hours(1));
        assert_eq!(out.table.numeric_column("consumption").unwrap(), &[Some(5.5)]);
    }

    #[test]
    fn bucket_without_present_values_is_missing() {
        let input = rows(
            &["2023-01-01 12:00", "2023-01-01 13:10"],
            &[Some(5.0), None],
        );
        let out = resample_mean(&input, BucketWidth::hours(1));
        assert_eq!(out.table.numeric_column("consumption").unwrap(), &[Some(5.0), None]);
    }

    #[test]
    fn gaps_are_counted_in_span() {
        let input = rows(
            &["2023-01-01 10:15", "2023-01-01 13:45"],
            &[Some(1.0), Some(2.0)],
        );
        let out = resample_mean(&input, BucketWidth::hours(1));
        assert_eq!(out.span, 4);
        assert_eq!(out.empty_buckets(), 2);
        assert_eq!(
            out.table.time_index().unwrap().values,
            vec![Some(ts("2023-01-01 10:00")), Some(ts("2023-01-01 13:00"))]
        );
    }

    #[test]
    fn far_outlier_costs_one_row() {
        let input = rows(
            &["2023-01-01 10:15", "9999-12-31 23:59"],
            &[Some(1.0), Some(2.0)],
        );
        let out = resample_mean(&input, BucketWidth::minutes(15));
        assert_eq!(out.table.len(), 2);
        assert!(out.span > 250_000_000);
    }

    #[test]
    fn empty_input_keeps_field_names() {
        let out = resample_mean(&rows(&[], &[]), BucketWidth::hours(1));
        assert_eq!(out.span, 0);
        assert!(out.table.is_empty());
        assert_eq!(out.table.field_names(), vec!["consumption"]);
    }

    #[test]
    fn drop_incomplete_removes_rows_with_any_gap() {
        let table = Table::new()
            .with_column("a", ColumnData::numeric([Some(1.0), None, Some(3.0)]))
            .unwrap()
            .with_column("b", ColumnData::numeric([Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap()
            .with_index(TimeIndex::new(
                "timestamp",
                vec![Some(ts("2023-01-01 00:00")), Some(ts("2023-01-01 01:00")), None],
            ))
            .unwrap();
        let (out, dropped) = drop_incomplete(table);
        assert_eq!(dropped, 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out.numeric_column("b").unwrap(), &[Some(1.0)]);
    }

    #[test]
    fn drop_incomplete_is_noop_on_clean_table() {
        let table = Table::new()
            .with_column("a", ColumnData::numeric([Some(1.0), Some(2.0)]))
            .unwrap();
        let (out, dropped) = drop_incomplete(table.clone());
        assert_eq!(dropped, 0);
        assert_eq!(out, table);
    }
}
